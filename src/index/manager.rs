//! Index manager: owns one in-memory tantivy index per course
//!
//! Writes and clears of a course are serialized through that course's writer
//! lock. Every clear bumps the course generation; writes tagged with an older
//! generation are dropped, so a crawl that started before a clear can never
//! bring the cleared documents back.

use super::schema::{build_schema, IndexFields};
use super::Document;
use crate::config::SearchConfig;
use crate::Result;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, Term};

/// Writer side of a course index
struct CourseWriter {
    writer: IndexWriter,
    generation: u64,
}

/// The index of a single course
pub(crate) struct CourseIndex {
    pub(crate) index: Index,
    pub(crate) fields: IndexFields,
    pub(crate) reader: IndexReader,
    writer: Mutex<CourseWriter>,
}

impl CourseIndex {
    fn create(writer_memory_bytes: usize) -> Result<Self> {
        let (schema, fields) = build_schema();
        let index = Index::create_in_ram(schema);
        let writer: IndexWriter = index.writer_with_num_threads(1, writer_memory_bytes)?;
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;

        Ok(Self {
            index,
            fields,
            reader,
            writer: Mutex::new(CourseWriter {
                writer,
                generation: 0,
            }),
        })
    }

    fn lock_writer(&self) -> MutexGuard<'_, CourseWriter> {
        // Uncommitted operations are rolled back on failure, so the state
        // behind a poisoned lock is still usable
        self.writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn generation(&self) -> u64 {
        self.lock_writer().generation
    }

    /// Replaces documents by URL; `None` skips the generation check
    fn write(&self, expected_generation: Option<u64>, documents: &[Document]) -> Result<bool> {
        let mut state = self.lock_writer();

        if let Some(expected) = expected_generation {
            if expected != state.generation {
                return Ok(false);
            }
        }

        if let Err(e) = add_documents(&mut state.writer, &self.fields, documents) {
            state.writer.rollback()?;
            return Err(e);
        }
        state.writer.commit()?;
        self.reader.reload()?;

        Ok(true)
    }

    fn clear(&self) -> Result<u64> {
        let mut state = self.lock_writer();
        state.generation += 1;
        state.writer.delete_all_documents()?;
        state.writer.commit()?;
        self.reader.reload()?;

        Ok(state.generation)
    }

    fn document_count(&self) -> u64 {
        self.reader.searcher().num_docs()
    }
}

fn add_documents(
    writer: &mut IndexWriter,
    fields: &IndexFields,
    documents: &[Document],
) -> Result<()> {
    for document in documents {
        writer.delete_term(Term::from_field_text(fields.url, &document.url));
        writer.add_document(doc!(
            fields.url => document.url.clone(),
            fields.title => document.title.clone(),
            fields.content => document.content.clone(),
            fields.indexed_at => document.indexed_at.timestamp(),
        ))?;
    }
    Ok(())
}

/// Owns the per-course indexes
///
/// Course indexes are created lazily on first write.
pub struct IndexManager {
    writer_memory_bytes: usize,
    courses: RwLock<HashMap<String, Arc<CourseIndex>>>,
}

impl IndexManager {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            writer_memory_bytes: config.writer_memory_bytes,
            courses: RwLock::new(HashMap::new()),
        }
    }

    /// Adds or replaces documents in a course index
    ///
    /// Documents are keyed by URL: indexing a URL twice leaves one document.
    ///
    /// # Returns
    ///
    /// The number of documents written
    pub fn index(&self, course_id: &str, documents: &[Document]) -> Result<usize> {
        self.course_or_create(course_id)?.write(None, documents)?;
        tracing::info!("Indexed {} document(s) for course {}", documents.len(), course_id);
        Ok(documents.len())
    }

    /// Indexes documents only if the course has not been cleared since
    /// `generation` was read
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - Documents were committed
    /// * `Ok(false)` - A clear happened in between; nothing was written
    pub fn index_at_generation(
        &self,
        course_id: &str,
        generation: u64,
        documents: &[Document],
    ) -> Result<bool> {
        let written = self
            .course_or_create(course_id)?
            .write(Some(generation), documents)?;

        if written {
            tracing::info!("Indexed {} document(s) for course {}", documents.len(), course_id);
        } else {
            tracing::warn!(
                "Discarding {} document(s) for course {}: index was cleared during the crawl",
                documents.len(),
                course_id
            );
        }
        Ok(written)
    }

    /// Removes every document of a course
    ///
    /// Clearing an empty or unknown course is not an error.
    pub fn clear(&self, course_id: &str) -> Result<()> {
        let generation = self.course_or_create(course_id)?.clear()?;
        tracing::info!("Cleared index for course {} (generation {})", course_id, generation);
        Ok(())
    }

    /// Current generation of a course; starts at 0 and grows with each clear
    pub fn generation(&self, course_id: &str) -> u64 {
        self.course(course_id).map_or(0, |course| course.generation())
    }

    /// Number of committed documents in a course index
    pub fn document_count(&self, course_id: &str) -> u64 {
        self.course(course_id)
            .map_or(0, |course| course.document_count())
    }

    /// Identifiers of every course that has an index, sorted
    pub fn course_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.read_courses().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub(crate) fn course(&self, course_id: &str) -> Option<Arc<CourseIndex>> {
        self.read_courses().get(course_id).cloned()
    }

    fn course_or_create(&self, course_id: &str) -> Result<Arc<CourseIndex>> {
        if let Some(course) = self.course(course_id) {
            return Ok(course);
        }

        let mut courses = self
            .courses
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(course) = courses.get(course_id) {
            return Ok(course.clone());
        }

        tracing::debug!("Creating index for course {}", course_id);
        let course = Arc::new(CourseIndex::create(self.writer_memory_bytes)?);
        courses.insert(course_id.to_string(), course.clone());
        Ok(course)
    }

    fn read_courses(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Arc<CourseIndex>>> {
        self.courses
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
