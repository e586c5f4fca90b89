//! Actions backed by the code-intelligence provider.
//!
//! Each handler snapshots the view into an [`IntelRequest`], asks the
//! provider and applies the answer. Provider failures land on the status
//! line; nothing here panics on a bad answer.

use std::path::Path;

use core_state::{JumpLocation, View, lexical_scopes};
use core_text::Location;
use core_text::motion::word_at;

use super::{DispatchResult, io, report};
use crate::context::EditorContext;
use crate::intel::{CandidateKind, IntelError, IntelRequest, QueryKind, What, format_json};
use crate::probes;

/// Reformat the whole buffer. JSON files use the built-in printer, anything
/// else goes to the configured formatter. The rewrite is one undo step.
pub(crate) fn handle_format(ctx: &mut EditorContext, view: &mut View) -> DispatchResult {
    let text = view.buffer.text();
    let path = view.buffer.path();
    let formatted = if path.is_some_and(|p| p.extension().is_some_and(|e| e == "json")) {
        format_json(&text)
    } else {
        ctx.intel.format(path, &text)
    };
    let formatted = match formatted {
        Ok(formatted) => formatted,
        Err(err) => return report(view, "format", err),
    };
    let formatted = formatted.strip_suffix('\n').unwrap_or(&formatted);
    if formatted == text {
        view.set_info("Already formatted");
        return DispatchResult::done();
    }
    if let Err(err) = view.buffer.replace_all(formatted) {
        return report(view, "format", err);
    }
    view.cursor.reset_selection();
    view.cursor.relocate(&view.buffer);
    tracing::debug!(target: "actions.intel", lines = view.buffer.line_count(), "formatted");
    view.set_info("Formatted");
    DispatchResult::done()
}

/// Refresh the "lint" gutter messages, in the background when a probe
/// scheduler is attached.
pub(crate) fn handle_lint(ctx: &mut EditorContext, view: &mut View) -> DispatchResult {
    if probes::spawn_lint(ctx, view) {
        view.set_info("Linting");
        return DispatchResult::done();
    }
    match ctx.intel.lint(view.buffer.path(), &view.buffer.text()) {
        Ok(diagnostics) => {
            let count = probes::apply_lint(view, diagnostics);
            view.set_info(format!("{count} lint message(s)"));
            DispatchResult::done()
        }
        Err(err) => report(view, "lint", err),
    }
}

pub(crate) fn handle_template(ctx: &mut EditorContext, view: &mut View) -> DispatchResult {
    let req = IntelRequest::from_view(view);
    let template = match ctx.intel.template(&req) {
        Ok(template) => template,
        Err(err) => return report(view, "template", err),
    };
    match view.open_template(&template) {
        Ok(_) => DispatchResult::done(),
        Err(err) => report(view, "template", err),
    }
}

const SINGLE_NAME: &str = "$0_identifier$";

/// One field per value of a multi-value result list, labelled with its type:
/// `func() (int, error)` gives `$0_int$, $1_error$`.
fn result_fields(type_name: &str) -> Option<String> {
    let (_, results) = type_name.split_once(") (")?;
    let results = results.strip_suffix(')').unwrap_or(results);
    let fields: Vec<String> = results
        .split(',')
        .map(str::trim)
        .enumerate()
        .map(|(i, ty)| format!("${i}_{ty}$"))
        .collect();
    Some(fields.join(", "))
}

/// Turn the call or literal under the cursor into an assignment by opening
/// a `lhs := ` template in front of it; the names are filled in first.
pub(crate) fn handle_extract_variable(ctx: &mut EditorContext, view: &mut View) -> DispatchResult {
    let req = IntelRequest::from_view(view);
    let what = match ctx.intel.what(&req) {
        Ok(what) => what,
        Err(err) => return report(view, "extract_variable", err),
    };
    let Some(inner) = what.enclosing.first() else {
        view.set_error("Nothing to extract here");
        return DispatchResult::declined();
    };

    let (start, end, lhs) = match inner.description.as_str() {
        "identifier" => {
            let desc = match ctx.intel.describe(&req) {
                Ok(desc) => desc,
                Err(err) => return report(view, "extract_variable", err),
            };
            let call = what
                .enclosing
                .iter()
                .find(|e| e.description.starts_with("function"));
            let Some(call) = call.filter(|_| desc.detail != "type" && desc.type_name.starts_with("func")) else {
                view.set_error("Can only extract function calls and literals");
                return DispatchResult::declined();
            };
            let lhs = result_fields(&desc.type_name).unwrap_or_else(|| SINGLE_NAME.to_string());
            (call.start, call.end, lhs)
        }
        "basic literal" => (inner.start, inner.end, SINGLE_NAME.to_string()),
        other => {
            view.set_error(format!("Can not extract a {other}"));
            return DispatchResult::declined();
        }
    };

    // the expression stays in place; the template is typed in front of it
    let expr = view.buffer.substr(start, end);
    view.cursor.reset_selection();
    view.cursor.goto(start, &view.buffer);
    tracing::debug!(target: "actions.intel", %expr, line = start.line, "extract_variable");
    match view.open_template(&format!("{lhs} := ")) {
        Ok(_) => DispatchResult::done(),
        Err(err) => report(view, "extract_variable", err),
    }
}

/// Complete the word before the cursor. A single candidate is accepted
/// directly; with several the prompter picks one by name.
pub(crate) fn handle_autocomplete(ctx: &mut EditorContext, view: &mut View) -> DispatchResult {
    let req = IntelRequest::from_view(view);
    let candidates = match ctx.intel.complete(&req) {
        Ok(candidates) => candidates,
        Err(err) => return report(view, "autocomplete", err),
    };
    let chosen = match candidates.as_slice() {
        [] => {
            view.set_info("No completions");
            return DispatchResult::done();
        }
        [only] => only.clone(),
        [first, ..] => {
            let Some(answer) = ctx.prompter.prompt("Complete: ", &first.name) else {
                return DispatchResult::declined();
            };
            match candidates.iter().find(|c| c.name == answer.trim()) {
                Some(c) => c.clone(),
                None => {
                    view.set_error(format!("No completion named {}", answer.trim()));
                    return DispatchResult::declined();
                }
            }
        }
    };

    let loc = view.cursor.loc;
    if let Some((start, _)) = word_at(&view.buffer, loc).filter(|(s, _)| *s < loc) {
        if let Err(err) = view.buffer.remove(start, loc) {
            return report(view, "autocomplete", err);
        }
        view.cursor.goto(start, &view.buffer);
    }
    view.cursor.reset_selection();
    tracing::debug!(target: "actions.intel", candidate = %chosen.name, "autocomplete");
    match chosen.kind {
        CandidateKind::Func { .. } => match view.open_template(&chosen.insertion()) {
            Ok(_) => DispatchResult::done(),
            Err(err) => report(view, "autocomplete", err),
        },
        CandidateKind::Value => {
            super::edit::insert_text(view, &chosen.name);
            DispatchResult::done()
        }
    }
}

pub(crate) fn handle_rename(ctx: &mut EditorContext, view: &mut View) -> DispatchResult {
    let current = word_at(&view.buffer, view.cursor.loc)
        .map(|(s, e)| view.buffer.substr(s, e))
        .unwrap_or_default();
    let Some(answer) = ctx.prompter.prompt("Rename to: ", &current) else {
        return DispatchResult::declined();
    };
    let to = answer.trim();
    if to.is_empty() || to == current {
        return DispatchResult::declined();
    }
    let req = IntelRequest::from_view(view);
    match ctx.intel.rename(&req, to) {
        Ok(text) => {
            if let Err(err) = view.buffer.replace_all(&text) {
                return report(view, "rename", err);
            }
            view.cursor.reset_selection();
            view.cursor.relocate(&view.buffer);
            view.set_info(format!("Renamed {current} to {to}"));
            DispatchResult::done()
        }
        Err(err) => report(view, "rename", err),
    }
}

pub(crate) fn handle_describe(ctx: &mut EditorContext, view: &mut View) -> DispatchResult {
    let req = IntelRequest::from_view(view);
    match ctx.intel.describe(&req) {
        Ok(desc) if desc.type_name.is_empty() => {
            view.set_info(desc.desc);
            DispatchResult::done()
        }
        Ok(desc) => {
            view.set_info(format!("{}: {}", desc.desc, desc.type_name));
            DispatchResult::done()
        }
        Err(err) => report(view, "describe", err),
    }
}

pub(crate) fn handle_referrers(ctx: &mut EditorContext, view: &mut View) -> DispatchResult {
    let req = IntelRequest::from_view(view);
    let entries = match ctx.intel.query(QueryKind::Referrers, &req) {
        Ok(entries) => entries,
        Err(err) => return report(view, "referrers", err),
    };
    if entries.is_empty() {
        view.set_info("No referrers");
        return DispatchResult::done();
    }
    let lines: Vec<String> = entries
        .iter()
        .map(|entry| match &entry.position {
            Some(pos) => {
                let file = pos
                    .path
                    .as_deref()
                    .or(req.path.as_deref())
                    .map_or_else(|| view.buffer.name().to_string(), |p| p.display().to_string());
                format!("{file}:{}:{}: {}", pos.loc.line + 1, pos.loc.column + 1, entry.description)
            }
            None => entry.description.clone(),
        })
        .collect();
    view.set_info(lines.join("\n"));
    DispatchResult::done()
}

/// Jump to the definition of the symbol under the cursor. Both ends of the
/// jump are pushed onto the history so `PrevLoc` comes back.
pub(crate) fn handle_goto_definition(ctx: &mut EditorContext, view: &mut View) -> DispatchResult {
    let req = IntelRequest::from_view(view);
    let target = match ctx.intel.definition(&req) {
        Ok(target) => target,
        Err(err) => return report(view, "goto_definition", err),
    };
    let origin = view.buffer.path().map(Path::to_path_buf);
    ctx.jumps.push(JumpLocation { path: origin.clone(), loc: view.cursor.loc });

    let path = target.path.or(origin);
    match path.as_deref() {
        Some(path) if view.buffer.path() != Some(path) => {
            if let Err(err) = io::switch_file(ctx, view, path, target.loc) {
                return report(view, "goto_definition", err);
            }
        }
        _ => {
            view.cursor.reset_selection();
            view.cursor.goto(target.loc, &view.buffer);
        }
    }
    ctx.jumps.push(JumpLocation { path, loc: view.cursor.loc });
    DispatchResult::done()
}

/// Grow the selection to the next enclosing syntactic region, falling back
/// to word / line / buffer when the provider has no answer.
pub(crate) fn handle_select_word(ctx: &mut EditorContext, view: &mut View) -> DispatchResult {
    let req = IntelRequest::from_view(view);
    let regions = match ctx.intel.what(&req) {
        Ok(What { enclosing, .. }) => enclosing.into_iter().map(|e| (e.start, e.end)).collect(),
        Err(IntelError::Unsupported(_)) => Vec::new(),
        Err(err) => {
            tracing::debug!(target: "actions.intel", %err, "select_word_fallback");
            Vec::new()
        }
    };
    if view.cursor.select_enclosing(&regions, &view.buffer) {
        return DispatchResult::done();
    }
    let scopes = lexical_scopes(&view.buffer, anchor_loc(view));
    DispatchResult::from_bool(view.cursor.select_enclosing(&scopes, &view.buffer))
}

/// Start of the selection, or the cursor when nothing is selected.
fn anchor_loc(view: &View) -> Location {
    view.cursor.selection().map_or(view.cursor.loc, |(start, _)| start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ScriptedPrompter;
    use crate::intel::{Candidate, CodeIntel, Description, Enclosing, IntelEntry, IntelLocation};
    use core_state::ViewId;
    use core_text::TextBuffer;
    use pretty_assertions::assert_eq;

    /// Provider answering from canned values.
    #[derive(Default)]
    struct Canned {
        what: What,
        describe: Description,
        candidates: Vec<Candidate>,
        definition: Option<IntelLocation>,
        formatted: Option<String>,
    }

    impl CodeIntel for Canned {
        fn supports_what(&self) -> bool {
            true
        }
        fn what(&self, _req: &IntelRequest) -> Result<What, IntelError> {
            Ok(self.what.clone())
        }
        fn describe(&self, _req: &IntelRequest) -> Result<Description, IntelError> {
            Ok(self.describe.clone())
        }
        fn complete(&self, _req: &IntelRequest) -> Result<Vec<Candidate>, IntelError> {
            Ok(self.candidates.clone())
        }
        fn definition(&self, _req: &IntelRequest) -> Result<IntelLocation, IntelError> {
            self.definition.clone().ok_or(IntelError::Failed("no definition".into()))
        }
        fn query(&self, _kind: QueryKind, _req: &IntelRequest) -> Result<Vec<IntelEntry>, IntelError> {
            Ok(vec![IntelEntry {
                description: "call".into(),
                position: Some(IntelLocation { path: None, loc: Location::new(1, 0) }),
            }])
        }
        fn rename(&self, req: &IntelRequest, to: &str) -> Result<String, IntelError> {
            Ok(req.text.replace("old", to))
        }
        fn format(&self, _path: Option<&Path>, text: &str) -> Result<String, IntelError> {
            Ok(self.formatted.clone().unwrap_or_else(|| text.to_string()))
        }
    }

    fn region(description: &str, start: (usize, usize), end: (usize, usize)) -> Enclosing {
        Enclosing {
            description: description.into(),
            start: Location::new(start.0, start.1),
            end: Location::new(end.0, end.1),
        }
    }

    fn view(text: &str) -> View {
        View::new(ViewId(0), TextBuffer::from_text("main.go", text))
    }

    #[test]
    fn format_is_a_single_undo_step() {
        let mut ctx = EditorContext::default().with_intel(Canned {
            formatted: Some("a := 1\nb := 2\n".into()),
            ..Canned::default()
        });
        let mut v = view("a:=1\nb:=2");
        assert!(handle_format(&mut ctx, &mut v).done);
        assert_eq!(v.buffer.text(), "a := 1\nb := 2");
        assert_eq!(v.buffer.undo_depth(), 1);
        v.buffer.undo();
        assert_eq!(v.buffer.text(), "a:=1\nb:=2");
    }

    #[test]
    fn json_buffers_use_builtin_formatter() {
        let mut ctx = EditorContext::default();
        let mut v = View::new(ViewId(0), TextBuffer::for_path("cfg.json", r#"{"a":1}"#));
        assert!(handle_format(&mut ctx, &mut v).done);
        assert_eq!(v.buffer.text(), "{\n\t\"a\": 1\n}");
    }

    #[test]
    fn unsupported_provider_reports_error() {
        let mut ctx = EditorContext::default();
        let mut v = view("x");
        assert!(!handle_format(&mut ctx, &mut v).done);
        assert_eq!(v.status().map(|s| s.text.as_str()), Some("format is not supported"));
    }

    #[test]
    fn extract_two_result_call() {
        let mut ctx = EditorContext::default().with_intel(Canned {
            what: What {
                enclosing: vec![
                    region("identifier", (0, 7), (0, 11)),
                    region("function call (selector)", (0, 4), (0, 14)),
                ],
                same_ids: Vec::new(),
            },
            describe: Description {
                detail: "value".into(),
                desc: "os.Open".into(),
                type_name: "func(name string) (*File, error)".into(),
            },
            ..Canned::default()
        });
        let mut v = view("use(os.Open(p))");
        v.cursor.goto(Location::new(0, 7), &v.buffer);
        assert!(handle_extract_variable(&mut ctx, &mut v).done);
        assert_eq!(v.buffer.text(), "use(*File, error := os.Open(p))");
        assert_eq!(v.template().map(|t| t.current_label()), Some("*File"));
    }

    #[test]
    fn extract_names_every_result_by_type() {
        let mut ctx = EditorContext::default().with_intel(Canned {
            what: What {
                enclosing: vec![
                    region("identifier", (0, 0), (0, 4)),
                    region("function call", (0, 0), (0, 6)),
                ],
                same_ids: Vec::new(),
            },
            describe: Description {
                detail: "value".into(),
                desc: "load".into(),
                type_name: "func() (int, string, error)".into(),
            },
            ..Canned::default()
        });
        let mut v = view("load()");
        assert!(handle_extract_variable(&mut ctx, &mut v).done);
        assert_eq!(v.buffer.text(), "int, string, error := load()");
        for label in ["int", "string", "error"] {
            assert_eq!(v.template().map(|t| t.current_label()), Some(label));
            v.advance_template().unwrap();
        }
        assert!(!v.has_template());
    }

    #[test]
    fn single_result_calls_get_one_name() {
        assert_eq!(result_fields("func(s string) error"), None);
        assert_eq!(result_fields("func() (a, b)").as_deref(), Some("$0_a$, $1_b$"));
    }

    #[test]
    fn extract_literal_uses_single_name() {
        let mut ctx = EditorContext::default().with_intel(Canned {
            what: What {
                enclosing: vec![region("basic literal", (0, 5), (0, 7))],
                same_ids: Vec::new(),
            },
            ..Canned::default()
        });
        let mut v = view("f(1, 42)");
        v.cursor.goto(Location::new(0, 6), &v.buffer);
        assert!(handle_extract_variable(&mut ctx, &mut v).done);
        assert_eq!(v.buffer.text(), "f(1, identifier := 42)");
    }

    #[test]
    fn extract_rejects_other_nodes() {
        let mut ctx = EditorContext::default().with_intel(Canned {
            what: What {
                enclosing: vec![region("block", (0, 0), (0, 2))],
                same_ids: Vec::new(),
            },
            ..Canned::default()
        });
        let mut v = view("{}");
        assert!(!handle_extract_variable(&mut ctx, &mut v).done);
        assert_eq!(v.status().map(|s| s.text.as_str()), Some("Can not extract a block"));
    }

    #[test]
    fn autocomplete_replaces_partial_word() {
        let mut ctx = EditorContext::default().with_intel(Canned {
            candidates: vec![Candidate { name: "Println".into(), kind: CandidateKind::Value }],
            ..Canned::default()
        });
        let mut v = view("fmt.Pri");
        v.cursor.goto(Location::new(0, 7), &v.buffer);
        assert!(handle_autocomplete(&mut ctx, &mut v).done);
        assert_eq!(v.buffer.text(), "fmt.Println");
        assert_eq!(v.cursor.loc, Location::new(0, 11));
    }

    #[test]
    fn autocomplete_function_opens_template() {
        let mut ctx = EditorContext::default()
            .with_intel(Canned {
                candidates: vec![
                    Candidate { name: "max".into(), kind: CandidateKind::Func { params: vec!["a".into(), "b".into()] } },
                    Candidate { name: "min".into(), kind: CandidateKind::Value },
                ],
                ..Canned::default()
            })
            .with_prompter(ScriptedPrompter::new(["max"]));
        let mut v = view("ma");
        v.cursor.goto(Location::new(0, 2), &v.buffer);
        assert!(handle_autocomplete(&mut ctx, &mut v).done);
        assert_eq!(v.buffer.text(), "max(a, b)");
        assert!(v.has_template());
    }

    #[test]
    fn rename_rewrites_buffer() {
        let mut ctx = EditorContext::default()
            .with_intel(Canned::default())
            .with_prompter(ScriptedPrompter::new(["fresh"]));
        let mut v = view("old := 1\nuse(old)");
        assert!(handle_rename(&mut ctx, &mut v).done);
        assert_eq!(v.buffer.text(), "fresh := 1\nuse(fresh)");
        assert_eq!(v.status().map(|s| s.text.as_str()), Some("Renamed old to fresh"));
    }

    #[test]
    fn referrers_are_listed_with_positions() {
        let mut ctx = EditorContext::default().with_intel(Canned::default());
        let mut v = view("a\nb");
        handle_referrers(&mut ctx, &mut v);
        assert_eq!(v.status().map(|s| s.text.as_str()), Some("main.go:2:1: call"));
    }

    #[test]
    fn goto_definition_records_both_ends() {
        let mut ctx = EditorContext::default().with_intel(Canned {
            definition: Some(IntelLocation { path: None, loc: Location::new(2, 1) }),
            ..Canned::default()
        });
        let mut v = view("a\nb\ncc");
        assert!(handle_goto_definition(&mut ctx, &mut v).done);
        assert_eq!(v.cursor.loc, Location::new(2, 1));
        assert_eq!(ctx.jumps.len(), 2);
        assert_eq!(ctx.jumps.prev().map(|j| j.loc), Some(Location::new(0, 0)));
    }

    #[test]
    fn select_word_prefers_provider_regions() {
        let mut ctx = EditorContext::default().with_intel(Canned {
            what: What {
                enclosing: vec![region("identifier", (0, 4), (0, 5)), region("call", (0, 0), (0, 6))],
                same_ids: Vec::new(),
            },
            ..Canned::default()
        });
        let mut v = view("foo(x)");
        v.cursor.goto(Location::new(0, 4), &v.buffer);
        handle_select_word(&mut ctx, &mut v);
        assert_eq!(v.cursor.get_selection(&v.buffer), "x");
        handle_select_word(&mut ctx, &mut v);
        assert_eq!(v.cursor.get_selection(&v.buffer), "foo(x)");
    }

    #[test]
    fn select_word_falls_back_to_lexical_scopes() {
        let mut ctx = EditorContext::default();
        let mut v = view("let value = 1;");
        v.cursor.goto(Location::new(0, 6), &v.buffer);
        assert!(handle_select_word(&mut ctx, &mut v).done);
        assert_eq!(v.cursor.get_selection(&v.buffer), "value");
    }
}
