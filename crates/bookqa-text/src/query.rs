use tantivy::query::{BooleanQuery, Occur, PhraseQuery, Query, TermQuery};
use tantivy::schema::{Field, IndexRecordOption};
use tantivy::tokenizer::{TextAnalyzer, TokenStream};
use tantivy::Term;

/// Analyzed query terms with their token positions.
pub fn analyze(analyzer: &mut TextAnalyzer, field: Field, text: &str) -> Vec<(usize, Term)> {
	let mut terms = Vec::new();
	let mut stream = analyzer.token_stream(text);
	while stream.advance() {
		let token = stream.token();
		terms.push((token.position, Term::from_field_text(field, &token.text)));
	}
	terms
}

/// BM25 disjunction over the unique analyzed terms.
///
/// Text is never handed to the query parser, so punctuation in questions
/// ("India?", "don't") cannot produce syntax errors. Returns `None` when no
/// term survives analysis.
pub fn terms_query(terms: &[(usize, Term)]) -> Option<Box<dyn Query>> {
	if terms.is_empty() { return None; }
	let mut seen: Vec<&Term> = Vec::new();
	let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();
	for (_, term) in terms {
		if seen.contains(&term) { continue; }
		seen.push(term);
		clauses.push((Occur::Should, Box::new(TermQuery::new(term.clone(), IndexRecordOption::WithFreqs))));
	}
	Some(Box::new(BooleanQuery::new(clauses)))
}

/// Only documents containing the analyzed terms at the query's relative
/// positions. A single-term query degenerates to a term query.
pub fn phrase_query(terms: &[(usize, Term)]) -> Option<Box<dyn Query>> {
	match terms {
		[] => None,
		[(_, term)] => Some(Box::new(TermQuery::new(term.clone(), IndexRecordOption::WithFreqs))),
		_ => Some(Box::new(PhraseQuery::new_with_offset(terms.to_vec()))),
	}
}
