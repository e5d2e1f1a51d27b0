use tower_lsp::jsonrpc::Result as LspResult;
use tower_lsp::lsp_types::*;

use crate::layout::{layout_for, Phase, PhaseLayout, RecordSpec};
use crate::lsp::backend::Backend;
use crate::lsp::document::DocumentState;
use crate::parser::lexer::{tokenize_line, FIELD_DELIMITER};
use crate::parser::parse_lines;
use crate::validation::{build_context, resolve_phase, validate_document, Severity, ValidationError};

/// Source tag attached to every published diagnostic
pub const DIAGNOSTIC_SOURCE: &str = "censo-ls";

/// Trait for handling hover requests
#[tower_lsp::async_trait]
pub trait HandleHover {
    async fn handle_hover(&self, params: HoverParams) -> LspResult<Option<Hover>>;
}

/// Trait for handling completion requests
#[tower_lsp::async_trait]
pub trait HandleCompletion {
    async fn handle_completion(
        &self,
        params: CompletionParams,
    ) -> LspResult<Option<CompletionResponse>>;
}

/// Trait for handling document symbols
#[tower_lsp::async_trait]
pub trait HandleDocumentSymbol {
    async fn handle_document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> LspResult<Option<DocumentSymbolResponse>>;
}

/// Trait for handling diagnostics
#[tower_lsp::async_trait]
pub trait HandleDiagnostics {
    async fn create_document_state(&self, content: String) -> DocumentState;
    async fn publish_diagnostics(&self, uri: Url);
    fn create_lsp_diagnostic(&self, error: ValidationError, content: &str) -> Diagnostic;
}

#[tower_lsp::async_trait]
impl HandleHover for Backend {
    async fn handle_hover(&self, params: HoverParams) -> LspResult<Option<Hover>> {
        let tdpp = params.text_document_position_params;
        let uri = tdpp.text_document.uri;
        let pos = tdpp.position;

        let docs = self.documents.lock().await;
        let doc_state = match docs.get(&uri) {
            Some(state) => state,
            None => return Ok(None),
        };

        let line = doc_state.content.lines().nth(pos.line as usize).unwrap_or("");
        let layout = layout_for(doc_state.phase);

        Ok(hover_text(layout, line, pos.character as usize).map(|value| Hover {
            contents: HoverContents::Markup(MarkupContent {
                kind: MarkupKind::Markdown,
                value,
            }),
            range: None,
        }))
    }
}

#[tower_lsp::async_trait]
impl HandleCompletion for Backend {
    async fn handle_completion(
        &self,
        params: CompletionParams,
    ) -> LspResult<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri;
        let pos = params.text_document_position.position;

        let docs = self.documents.lock().await;
        let doc_state = match docs.get(&uri) {
            Some(state) => state,
            None => return Ok(None),
        };

        let completions = completion_items(
            layout_for(doc_state.phase),
            &doc_state.content,
            pos.line as usize,
            pos.character as usize,
        );

        if completions.is_empty() {
            Ok(None)
        } else {
            Ok(Some(CompletionResponse::Array(completions)))
        }
    }
}

#[tower_lsp::async_trait]
impl HandleDiagnostics for Backend {
    /// Create a new document state, resolving the phase of its content
    async fn create_document_state(&self, content: String) -> DocumentState {
        let profile = self.profiles.lock().await.get_effective_profile().await;
        let lines: Vec<&str> = content.lines().collect();
        let phase = resolve_phase(self.config.get_effective_phase(), &lines, &profile);

        DocumentState { content, phase }
    }

    /// Publish diagnostics for a document
    async fn publish_diagnostics(&self, uri: Url) {
        let docs = self.documents.lock().await;
        let doc_state = match docs.get(&uri) {
            Some(state) => state,
            None => return,
        };

        let profile = self.profiles.lock().await.get_effective_profile().await;
        let report = validate_document(&doc_state.content, Some(doc_state.phase), &profile);

        let diagnostics: Vec<Diagnostic> = report
            .errors
            .into_iter()
            .map(|error| self.create_lsp_diagnostic(error, &doc_state.content))
            .collect();

        self.client
            .publish_diagnostics(uri, diagnostics, None)
            .await;
    }

    fn create_lsp_diagnostic(&self, error: ValidationError, content: &str) -> Diagnostic {
        to_lsp_diagnostic(error, content)
    }
}

#[tower_lsp::async_trait]
impl HandleDocumentSymbol for Backend {
    async fn handle_document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> LspResult<Option<DocumentSymbolResponse>> {
        let uri = params.text_document.uri;

        let docs = self.documents.lock().await;
        let doc_state = match docs.get(&uri) {
            Some(state) => state,
            None => return Ok(None),
        };

        let symbols = document_symbols(&doc_state.content, doc_state.phase);
        Ok(Some(DocumentSymbolResponse::Nested(symbols)))
    }
}

/// Convert a finding into an LSP diagnostic.
///
/// Census lines are 1-based and LSP lines 0-based; file-wide findings
/// (line 0) land on the first line. Findings that name a field are
/// narrowed to that field's span.
pub fn to_lsp_diagnostic(error: ValidationError, content: &str) -> Diagnostic {
    let severity = match error.severity {
        Severity::Error => DiagnosticSeverity::ERROR,
        Severity::Warning => DiagnosticSeverity::WARNING,
        Severity::Info => DiagnosticSeverity::INFORMATION,
    };

    let line_idx = error.line.saturating_sub(1);
    let line = content.lines().nth(line_idx).unwrap_or("");
    let (start, end) = match error.field {
        Some(field) => field_span(line, field),
        None => (0, line.chars().count()),
    };

    Diagnostic::new(
        Range::new(
            Position::new(line_idx as u32, start as u32),
            Position::new(line_idx as u32, end as u32),
        ),
        Some(severity),
        Some(NumberOrString::String(error.rule.as_str().to_string())),
        Some(DIAGNOSTIC_SOURCE.to_string()),
        error.message,
        None,
        None,
    )
}

/// Character span of the 1-based `field` in `line`, or the whole line when
/// the line has fewer fields
pub fn field_span(line: &str, field: usize) -> (usize, usize) {
    let mut start = 0;
    for (idx, segment) in line.split(FIELD_DELIMITER).enumerate() {
        let len = segment.chars().count();
        if idx + 1 == field {
            return (start, start + len);
        }
        start += len + 1;
    }
    (0, line.chars().count())
}

/// 0-based index of the field under the cursor
fn field_at(line: &str, character: usize) -> usize {
    line.chars()
        .take(character)
        .filter(|&c| c == FIELD_DELIMITER)
        .count()
}

fn describe_record(spec: &RecordSpec) -> String {
    format!(
        "**{}** {}\n\n{} fields. May follow: {}.",
        spec.code,
        spec.description,
        spec.field_count,
        spec.predecessor_list()
    )
}

/// Markdown hover for the position `character` of `line`
pub fn hover_text(layout: &PhaseLayout, line: &str, character: usize) -> Option<String> {
    let fields = tokenize_line(line);
    let record_type = fields.first()?;
    let Some(spec) = layout.record(record_type) else {
        return Some(format!(
            "**{}** is not a record type of the {} phase",
            record_type, layout.phase
        ));
    };

    let field = field_at(line, character);
    if field == 0 {
        return Some(describe_record(spec));
    }

    let mut text = format!(
        "Field {} of {} on record **{}** ({})",
        field + 1,
        spec.field_count,
        spec.code,
        spec.description
    );
    if field == layout.key_field {
        text.push_str("\n\nEntity code");
    } else if Some(field) == layout.status_field && spec.code == layout.primary_code() {
        text.push_str("\n\nOperating status");
    } else if Some(field) == spec.class_field {
        text.push_str("\n\nClass code");
    }
    if field >= spec.field_count {
        text.push_str(&format!(
            "\n\nExtra field: record {} has {} fields",
            spec.code, spec.field_count
        ));
    }
    Some(text)
}

/// Record types that may start `line_idx`, given the record before it.
///
/// Only offered while the cursor is still in the record-type field.
pub fn completion_items(
    layout: &PhaseLayout,
    content: &str,
    line_idx: usize,
    character: usize,
) -> Vec<CompletionItem> {
    let lines: Vec<&str> = content.lines().collect();
    let line = lines.get(line_idx).copied().unwrap_or("");
    if field_at(line, character) > 0 {
        return Vec::new();
    }

    let typed: String = line.chars().take(character).collect();
    let typed = typed.trim();

    // Blank lines do not take a place in the record order
    let previous = lines[..line_idx.min(lines.len())]
        .iter()
        .rev()
        .find_map(|l| tokenize_line(l).into_iter().next());

    layout
        .records_allowed_after(previous.as_deref())
        .into_iter()
        .filter(|spec| spec.code.starts_with(typed))
        .map(|spec| CompletionItem {
            label: spec.code.to_string(),
            kind: Some(CompletionItemKind::KEYWORD),
            detail: Some(spec.description.to_string()),
            documentation: Some(Documentation::MarkupContent(MarkupContent {
                kind: MarkupKind::Markdown,
                value: describe_record(spec),
            })),
            ..Default::default()
        })
        .collect()
}

fn line_range(content: &str, first: usize, last: usize) -> Range {
    let first_idx = first.saturating_sub(1);
    let last_idx = last.saturating_sub(1);
    let last_len = content.lines().nth(last_idx).map_or(0, |l| l.chars().count());
    Range::new(
        Position::new(first_idx as u32, 0),
        Position::new(last_idx as u32, last_len as u32),
    )
}

/// One symbol per entity, with its declared classes as children
pub fn document_symbols(content: &str, phase: Phase) -> Vec<DocumentSymbol> {
    let lines: Vec<&str> = content.lines().collect();
    let records = parse_lines(&lines);
    let layout = layout_for(phase);
    let context = build_context(&records, layout, None);

    context
        .entities
        .iter()
        .map(|entity| {
            let first = entity.line();
            let last = entity.records.last().map_or(first, |r| r.line);

            let classes: Vec<DocumentSymbol> = entity
                .classes
                .iter()
                .filter_map(|class| {
                    let line = entity.class_line(class)?;
                    let range = line_range(content, line, line);
                    Some(DocumentSymbol {
                        name: format!("Class {}", class),
                        detail: None,
                        kind: SymbolKind::CLASS,
                        tags: None,
                        #[allow(deprecated)]
                        deprecated: Some(false),
                        range,
                        selection_range: range,
                        children: None,
                    })
                })
                .collect();

            let detail = entity
                .status
                .as_deref()
                .and_then(|status| layout.status_rule(status))
                .map(|rule| rule.label.to_string());

            DocumentSymbol {
                name: format!("Entity {}", entity.code),
                detail,
                kind: SymbolKind::MODULE,
                tags: None,
                #[allow(deprecated)]
                deprecated: Some(false),
                range: line_range(content, first, last),
                selection_range: line_range(content, first, first),
                children: if classes.is_empty() {
                    None
                } else {
                    Some(classes)
                },
            }
        })
        .collect()
}
