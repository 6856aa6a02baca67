use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use super::{AnnotationError, DocumentView};
use crate::error::Result;

/// An annotation engine: tokenizer, taggers, parsers and coreference.
///
/// Engines are expensive to build and not assumed to be thread-safe, so
/// `annotate` takes `&mut self`. Share one through [`SharedPipeline`].
pub trait AnnotationSource: Send {
    type Document: DocumentView;

    fn annotate(&mut self, text: &str) -> std::result::Result<Self::Document, AnnotationError>;
}

type Factory<A> = Box<dyn Fn() -> std::result::Result<A, AnnotationError> + Send + Sync>;

/// Lazily built, process-wide annotation engine.
///
/// The engine is constructed on first use, at most once even when several
/// threads race on that first call. Annotation calls are serialized through a
/// mutex; the documents they return are immutable and can be scanned
/// concurrently.
pub struct SharedPipeline<A> {
    engine: OnceCell<Mutex<A>>,
    factory: Factory<A>,
}

impl<A: AnnotationSource> SharedPipeline<A> {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> std::result::Result<A, AnnotationError> + Send + Sync + 'static,
    {
        Self {
            engine: OnceCell::new(),
            factory: Box::new(factory),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.engine.get().is_some()
    }

    fn engine(&self) -> Result<&Mutex<A>> {
        let engine = self.engine.get_or_try_init(|| {
            tracing::debug!("Constructing shared annotation engine");
            (self.factory)().map(Mutex::new)
        })?;
        Ok(engine)
    }

    pub fn annotate(&self, text: &str) -> Result<A::Document> {
        let engine = self.engine()?;
        let mut engine = engine.lock();
        tracing::trace!(chars = text.chars().count(), "Annotating text");
        Ok(engine.annotate(text)?)
    }

    /// Annotates lines as one document, joined with newlines.
    pub fn annotate_lines<S: AsRef<str>>(&self, lines: &[S]) -> Result<A::Document> {
        let text = lines
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join("\n");
        self.annotate(&text)
    }
}

impl<A> std::fmt::Debug for SharedPipeline<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedPipeline")
            .field("initialized", &self.engine.get().is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::annotation::{AnnotatedDocument, AnnotatedSentence};

    struct LineAnnotator;

    impl AnnotationSource for LineAnnotator {
        type Document = AnnotatedDocument;

        fn annotate(
            &mut self,
            text: &str,
        ) -> std::result::Result<AnnotatedDocument, AnnotationError> {
            Ok(text
                .lines()
                .map(AnnotatedSentence::from_text)
                .fold(AnnotatedDocument::new(), AnnotatedDocument::with_sentence))
        }
    }

    #[test]
    fn test_engine_is_lazy() {
        let pipeline = SharedPipeline::new(|| Ok(LineAnnotator));
        assert!(!pipeline.is_initialized());

        let doc = pipeline.annotate_lines(&["first line", "second line here"]).unwrap();

        assert!(pipeline.is_initialized());
        assert_eq!(doc.sentence_count(), 2);
        assert_eq!(doc.sentence(1).unwrap().len(), 3);
    }

    #[test]
    fn test_engine_built_once_under_contention() {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&built);
        let pipeline = SharedPipeline::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(LineAnnotator)
        });

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| pipeline.annotate("a b c").unwrap());
            }
        });

        assert_eq!(built.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_factory_failure_propagates() {
        let pipeline: SharedPipeline<LineAnnotator> =
            SharedPipeline::new(|| Err(AnnotationError::Unavailable("no models".into())));

        let err = pipeline.annotate("text").unwrap_err();

        assert!(matches!(
            err,
            crate::Error::Annotation(AnnotationError::Unavailable(_))
        ));
        assert!(!pipeline.is_initialized());
    }
}
