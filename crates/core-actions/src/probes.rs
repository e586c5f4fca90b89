//! Same-identifier highlights and lint diagnostics, computed in the
//! background when a probe scheduler is attached and inline otherwise.
//!
//! Every result is tagged with the buffer revision it was computed against;
//! [`pump_probes`] and [`drain_probes`] drop results whose revision or
//! generation is no longer current.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use core_events::probe::{ProbeKind, ProbeResult};
use core_state::{GutterMessage, View};
use core_text::Location;
use tracing::{debug, trace};

use crate::context::EditorContext;
use crate::intel::{CodeIntel, Diagnostic, IntelError, IntelRequest, What};

/// Gutter source tag used for lint diagnostics.
pub const LINT_SOURCE: &str = "lint";

#[derive(Debug)]
pub enum ProbePayload {
    Highlight(Result<Vec<(Location, Location)>, IntelError>),
    Lint(Result<Vec<Diagnostic>, IntelError>),
}

/// Spans to highlight for a `what` answer: the identifier under the cursor
/// and every other occurrence of it.
pub fn highlight_spans(what: &What) -> Vec<(Location, Location)> {
    let Some(ident) = what.enclosing.iter().find(|e| e.description == "identifier") else {
        return Vec::new();
    };
    if ident.start.line != ident.end.line {
        return Vec::new();
    }
    let len = ident.end.column.saturating_sub(ident.start.column);
    let mut spans = Vec::with_capacity(what.same_ids.len() + 1);
    spans.push((ident.start, ident.end));
    spans.extend(
        what.same_ids
            .iter()
            .filter(|start| **start != ident.start)
            .map(|start| (*start, Location::new(start.line, start.column + len))),
    );
    spans
}

fn compute_highlight(intel: &dyn CodeIntel, req: &IntelRequest) -> Result<Vec<(Location, Location)>, IntelError> {
    intel.what(req).map(|what| highlight_spans(&what))
}

/// Recompute the highlight spans for the cursor position.
pub fn refresh_highlight(ctx: &mut EditorContext, view: &mut View) {
    if !ctx.intel.supports_what() {
        view.highlights.clear();
        return;
    }
    let revision = view.buffer.revision();
    let req = IntelRequest::from_view(view);
    if let Some(probes) = ctx.probes.as_mut() {
        let intel = Arc::clone(&ctx.intel);
        probes.spawn(ProbeKind::Highlight, revision, move || {
            ProbePayload::Highlight(compute_highlight(intel.as_ref(), &req))
        });
        return;
    }
    let result = compute_highlight(ctx.intel.as_ref(), &req);
    apply_highlight(view, revision, result);
}

fn apply_highlight(view: &mut View, revision: u64, result: Result<Vec<(Location, Location)>, IntelError>) {
    match result {
        Ok(spans) => {
            trace!(target: "actions.probe", spans = spans.len(), revision, "highlight_applied");
            view.highlights.set(revision, spans);
        }
        Err(IntelError::Unsupported(_)) => view.highlights.clear(),
        Err(err) => {
            debug!(target: "actions.probe", %err, "highlight_failed");
            view.highlights.clear();
        }
    }
}

/// Start a background lint of the view's text. Returns false when no probe
/// scheduler is attached; the caller then lints inline.
pub fn spawn_lint(ctx: &mut EditorContext, view: &View) -> bool {
    let Some(probes) = ctx.probes.as_mut() else {
        return false;
    };
    let intel = Arc::clone(&ctx.intel);
    let path = view.buffer.path().map(Path::to_path_buf);
    let text = view.buffer.text();
    probes.spawn(ProbeKind::Lint, view.buffer.revision(), move || {
        ProbePayload::Lint(intel.lint(path.as_deref(), &text))
    });
    true
}

/// Replace the view's lint gutter messages. Returns how many were added.
pub fn apply_lint(view: &mut View, diagnostics: Vec<Diagnostic>) -> usize {
    view.gutter.clear(LINT_SOURCE);
    let count = diagnostics.len();
    for d in diagnostics {
        view.gutter.add(
            LINT_SOURCE,
            GutterMessage {
                line: d.line,
                text: d.message,
                severity: d.severity,
            },
        );
    }
    debug!(target: "actions.probe", count, "lint_applied");
    count
}

fn apply(view: &mut View, revision: u64, payload: ProbePayload) {
    match payload {
        ProbePayload::Highlight(result) => apply_highlight(view, revision, result),
        ProbePayload::Lint(Ok(diagnostics)) => {
            apply_lint(view, diagnostics);
        }
        ProbePayload::Lint(Err(err)) => {
            view.set_error(err.to_string());
        }
    }
}

fn deliver(ctx: &mut EditorContext, view: &mut View, result: ProbeResult<ProbePayload>) -> bool {
    let Some(probes) = ctx.probes.as_mut() else {
        return false;
    };
    let revision = view.buffer.revision();
    match probes.accept(result, revision) {
        Some(payload) => {
            apply(view, revision, payload);
            true
        }
        None => false,
    }
}

/// Apply every probe result that has already arrived. Returns how many were
/// applied (stale ones are dropped and not counted).
pub fn pump_probes(ctx: &mut EditorContext, view: &mut View) -> usize {
    let mut applied = 0;
    while let Some(result) = ctx.probes.as_mut().and_then(|p| p.try_next()) {
        if deliver(ctx, view, result) {
            applied += 1;
        }
    }
    applied
}

/// Wait until no probe is running (or `limit` passes) and apply what
/// arrives. Returns how many results were applied.
pub async fn drain_probes(ctx: &mut EditorContext, view: &mut View, limit: Duration) -> usize {
    let deadline = tokio::time::Instant::now() + limit;
    let mut applied = 0;
    loop {
        let Some(probes) = ctx.probes.as_mut() else {
            break;
        };
        if probes.pending() == 0 {
            break;
        }
        let next = tokio::time::timeout_at(deadline, probes.next()).await;
        let Ok(Some(result)) = next else {
            debug!(target: "actions.probe", pending = probes.pending(), "probe_drain_stopped");
            break;
        };
        if deliver(ctx, view, result) {
            applied += 1;
        }
    }
    applied + pump_probes(ctx, view)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intel::Enclosing;
    use core_state::{Severity, ViewId};
    use core_text::TextBuffer;

    fn what() -> What {
        What {
            enclosing: vec![Enclosing {
                description: "identifier".into(),
                start: Location::new(0, 4),
                end: Location::new(0, 7),
            }],
            same_ids: vec![Location::new(0, 4), Location::new(2, 1)],
        }
    }

    #[test]
    fn same_ids_get_identifier_length() {
        assert_eq!(
            highlight_spans(&what()),
            vec![
                (Location::new(0, 4), Location::new(0, 7)),
                (Location::new(2, 1), Location::new(2, 4)),
            ]
        );
    }

    #[test]
    fn no_identifier_means_no_spans() {
        assert!(highlight_spans(&What::default()).is_empty());
    }

    #[test]
    fn inline_refresh_without_provider_clears() {
        let mut ctx = EditorContext::default();
        let mut v = View::new(ViewId(0), TextBuffer::from_text("t", "abc"));
        v.highlights.set(v.buffer.revision(), vec![(Location::new(0, 0), Location::new(0, 1))]);
        refresh_highlight(&mut ctx, &mut v);
        assert!(v.highlights.spans(v.buffer.revision()).is_empty());
        assert!(v.status().is_none());
    }

    #[tokio::test]
    async fn motions_without_what_spawn_nothing() {
        let mut ctx = EditorContext::default().with_probes(tokio::runtime::Handle::current());
        let mut v = View::new(ViewId(0), TextBuffer::from_text("t", "abc"));
        crate::perform_action(&mut ctx, &mut v, crate::ActionId::CursorRight, true);
        assert_eq!(v.cursor.loc, Location::new(0, 1));
        assert_eq!(ctx.probes.as_ref().map(|p| p.pending()), Some(0));
        assert_eq!(pump_probes(&mut ctx, &mut v), 0);
    }

    #[test]
    fn lint_replaces_previous_messages() {
        let mut v = View::new(ViewId(0), TextBuffer::from_text("t", "a\nb"));
        let diag = |line| Diagnostic {
            line,
            column: 0,
            message: "bad".into(),
            severity: Severity::Warning,
        };
        apply_lint(&mut v, vec![diag(0), diag(1)]);
        assert_eq!(apply_lint(&mut v, vec![diag(1)]), 1);
        assert_eq!(v.gutter.lines(), vec![1]);
    }
}
