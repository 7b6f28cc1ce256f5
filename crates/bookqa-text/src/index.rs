use std::path::Path;

use tantivy::collector::TopDocs;
use tantivy::query::Query;
use tantivy::schema::{Field, Value};
use tantivy::{Index, IndexReader, IndexWriter, TantivyDocument, Term};

use bookqa_core::error::{Error, Result};
use bookqa_core::traits::TextSearcher;
use bookqa_core::types::{ChunkId, LexicalDocument, SearchHit};

use crate::query::{analyze, phrase_query, terms_query};
use crate::tantivy_utils::{build_schema, register_tokenizer};

const WRITER_HEAP_BYTES: usize = 50_000_000;

fn lexical_err(e: impl std::fmt::Display) -> Error {
	Error::Lexical(e.to_string())
}

/// Tantivy-backed term/phrase index over chunk text.
///
/// A freshly created index is not searchable until [`LexicalIndex::build`]
/// or [`LexicalIndex::add`] has committed documents; an index opened from
/// disk is searchable immediately. Mutation takes `&mut self`, so a shared
/// `&LexicalIndex` is always a stable read-only view.
pub struct LexicalIndex {
	index: Index,
	id_field: Field,
	text_field: Field,
	embedding_field: Field,
	reader: Option<IndexReader>,
}

impl LexicalIndex {
	pub fn in_memory() -> Result<Self> {
		Self::from_index(Index::create_in_ram(build_schema()), false)
	}

	/// Create an empty index in `index_dir`, replacing whatever was there.
	pub fn create_in_dir(index_dir: &Path) -> Result<Self> {
		if index_dir.exists() { std::fs::remove_dir_all(index_dir)?; }
		std::fs::create_dir_all(index_dir)?;
		let index = Index::create_in_dir(index_dir, build_schema()).map_err(lexical_err)?;
		Self::from_index(index, false)
	}

	pub fn open(index_dir: &Path) -> Result<Self> {
		if !index_dir.exists() {
			return Err(Error::NotFound(format!("lexical index {}", index_dir.display())));
		}
		let index = Index::open_in_dir(index_dir)
			.map_err(|e| Error::CorruptIndex(format!("{}: {e}", index_dir.display())))?;
		let opened = Self::from_index(index, true)?;
		tracing::info!(dir = %index_dir.display(), docs = opened.num_docs(), "opened lexical index");
		Ok(opened)
	}

	fn from_index(index: Index, ready: bool) -> Result<Self> {
		register_tokenizer(&index);
		let schema = index.schema();
		let field = |name: &str| schema.get_field(name).map_err(|e| Error::CorruptIndex(e.to_string()));
		let (id_field, text_field, embedding_field) = (field("id")?, field("text")?, field("embedding")?);
		let mut this = Self { index, id_field, text_field, embedding_field, reader: None };
		if ready { this.refresh_reader()?; }
		Ok(this)
	}

	fn refresh_reader(&mut self) -> Result<()> {
		if let Some(reader) = &self.reader {
			return reader.reload().map_err(lexical_err);
		}
		self.reader = Some(self.index.reader().map_err(lexical_err)?);
		Ok(())
	}

	fn writer(&self) -> Result<IndexWriter<TantivyDocument>> {
		self.index.writer(WRITER_HEAP_BYTES).map_err(lexical_err)
	}

	fn to_tantivy(&self, doc: &LexicalDocument) -> TantivyDocument {
		let mut out = TantivyDocument::default();
		out.add_u64(self.id_field, doc.id as u64);
		out.add_text(self.text_field, &doc.text);
		if let Some(embedding) = &doc.embedding {
			let bytes: Vec<u8> = embedding.iter().flat_map(|x| x.to_le_bytes()).collect();
			out.add_bytes(self.embedding_field, bytes.as_slice());
		}
		out
	}

	fn commit(&mut self, mut writer: IndexWriter<TantivyDocument>) -> Result<()> {
		writer.commit().map_err(lexical_err)?;
		writer.wait_merging_threads().map_err(lexical_err)?;
		self.refresh_reader()
	}

	/// Replace the whole contents with `documents`.
	pub fn build(&mut self, documents: &[LexicalDocument]) -> Result<()> {
		let mut writer = self.writer()?;
		writer.delete_all_documents().map_err(lexical_err)?;
		let mut seen = std::collections::HashSet::new();
		for doc in documents {
			if !seen.insert(doc.id) {
				writer.delete_term(Term::from_field_u64(self.id_field, doc.id as u64));
			}
			writer.add_document(self.to_tantivy(doc)).map_err(lexical_err)?;
		}
		self.commit(writer)?;
		tracing::info!(docs = self.num_docs(), "built lexical index");
		Ok(())
	}

	/// Insert `document`, replacing any document with the same id.
	pub fn add(&mut self, document: &LexicalDocument) -> Result<()> {
		let mut writer = self.writer()?;
		writer.delete_term(Term::from_field_u64(self.id_field, document.id as u64));
		writer.add_document(self.to_tantivy(document)).map_err(lexical_err)?;
		self.commit(writer)
	}

	pub fn is_ready(&self) -> bool {
		self.reader.is_some()
	}

	pub fn num_docs(&self) -> u64 {
		self.reader.as_ref().map_or(0, |r| r.searcher().num_docs())
	}

	/// Up to `k` `(doc_id, score)` pairs, best first. Documents sharing no
	/// analyzed term with the query are never returned.
	///
	/// Ranking has two tiers. Exact-phrase matches come first, their scores
	/// lifted above the best partial-overlap score; the remaining slots are
	/// filled from the term disjunction.
	pub fn search(&self, query_text: &str, k: usize) -> Result<Vec<(ChunkId, f32)>> {
		let reader = self.reader.as_ref().ok_or(Error::IndexNotReady)?;
		if k == 0 { return Ok(Vec::new()); }
		let terms = self.query_terms(query_text)?;
		let (Some(phrase), Some(disjunction)) = (phrase_query(&terms), terms_query(&terms)) else {
			tracing::debug!(query = query_text, "no searchable terms in query");
			return Ok(Vec::new());
		};

		let phrase_hits = self.collect(reader, phrase.as_ref(), k)?;
		if phrase_hits.len() == k { return Ok(phrase_hits); }
		let partial_hits: Vec<(ChunkId, f32)> = self
			.collect(reader, disjunction.as_ref(), k + phrase_hits.len())?
			.into_iter()
			.filter(|(id, _)| !phrase_hits.iter().any(|(p, _)| p == id))
			.take(k - phrase_hits.len())
			.collect();

		let floor = partial_hits.first().map_or(0.0, |(_, score)| *score);
		let mut hits: Vec<(ChunkId, f32)> = phrase_hits.into_iter().map(|(id, score)| (id, floor + score)).collect();
		hits.extend(partial_hits);
		Ok(hits)
	}

	/// Exact-phrase matches only.
	pub fn search_phrase(&self, query_text: &str, k: usize) -> Result<Vec<(ChunkId, f32)>> {
		let reader = self.reader.as_ref().ok_or(Error::IndexNotReady)?;
		if k == 0 { return Ok(Vec::new()); }
		let terms = self.query_terms(query_text)?;
		let Some(query) = phrase_query(&terms) else {
			tracing::debug!(query = query_text, "no searchable terms in query");
			return Ok(Vec::new());
		};
		self.collect(reader, query.as_ref(), k)
	}

	/// The stored text and embedding of document `id`, if present.
	pub fn document(&self, id: ChunkId) -> Result<Option<LexicalDocument>> {
		let reader = self.reader.as_ref().ok_or(Error::IndexNotReady)?;
		let searcher = reader.searcher();
		let query = tantivy::query::TermQuery::new(Term::from_field_u64(self.id_field, id as u64), tantivy::schema::IndexRecordOption::Basic);
		let Some((_, addr)) = searcher.search(&query, &TopDocs::with_limit(1)).map_err(lexical_err)?.into_iter().next() else {
			return Ok(None);
		};
		let doc: TantivyDocument = searcher.doc(addr).map_err(lexical_err)?;
		let text = doc.get_first(self.text_field).and_then(|v| v.as_str()).unwrap_or_default().to_string();
		let embedding = doc.get_first(self.embedding_field).and_then(|v| v.as_bytes()).map(|b| {
			b.chunks_exact(4).map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]])).collect()
		});
		Ok(Some(LexicalDocument { id, text, embedding }))
	}

	fn query_terms(&self, query_text: &str) -> Result<Vec<(usize, Term)>> {
		let mut analyzer = self.index.tokenizer_for_field(self.text_field).map_err(lexical_err)?;
		Ok(analyze(&mut analyzer, self.text_field, query_text))
	}

	fn collect(&self, reader: &IndexReader, query: &dyn Query, k: usize) -> Result<Vec<(ChunkId, f32)>> {
		let searcher = reader.searcher();
		let top_docs = searcher.search(query, &TopDocs::with_limit(k)).map_err(lexical_err)?;
		let mut hits = Vec::with_capacity(top_docs.len());
		for (score, addr) in top_docs {
			let doc: TantivyDocument = searcher.doc(addr).map_err(lexical_err)?;
			match doc.get_first(self.id_field).and_then(|v| v.as_u64()) {
				Some(id) => hits.push((id as ChunkId, score)),
				None => tracing::warn!(?addr, "lexical hit without id field"),
			}
		}
		Ok(hits)
	}
}

impl TextSearcher for LexicalIndex {
	fn search_text(&self, query: &str, k: usize) -> Result<Vec<SearchHit>> {
		Ok(self.search(query, k)?.into_iter().map(|(id, score)| SearchHit::lexical(id, score)).collect())
	}
}
