/* 📖 # Why use a separate file for these error tests?

The span trace tests depend on the module path and span names of this file.
Keeping them apart from error.rs means edits to the error module do not churn the
expected output.
*/

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;
    use crate::{FileType, NonfsError, NonfsResult, ResultExt};
    use expect_test::expect;
    use std::error::Error;
    use std::io;
    use std::path::PathBuf;
    use tracing::span;
    use tracing_error::ErrorLayer;
    use tracing_subscriber::layer::SubscriberExt;

    // 📖 # Why a scoped subscriber instead of a global one?
    // SpanTrace::capture() only records spans when an ErrorLayer is active. Installing it
    // with `with_default` confines it to the current test thread, so tests that expect
    // no trace are unaffected.
    fn with_error_layer<R>(f: impl FnOnce() -> R) -> R {
        let subscriber = tracing_subscriber::registry().with(ErrorLayer::default());
        tracing::subscriber::with_default(subscriber, f)
    }

    #[test]
    fn test_error_from_io_failure() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error = NonfsError::io("test.txt", io_err);

        match error.kind() {
            ErrorKind::IoFailure { path, .. } => {
                assert_eq!(path, &PathBuf::from("test.txt"));
            }
            _ => panic!("Expected IoFailure variant"),
        }
    }

    #[test]
    fn test_error_context_attachment() {
        let error = NonfsError::message("original error")
            .context("first context")
            .context("second context");

        assert_eq!(error.get_context().len(), 2);
        assert_eq!(error.get_context()[0], "first context");
        assert_eq!(error.get_context()[1], "second context");
    }

    #[test]
    fn test_error_with_context_lazy_evaluation() {
        let mut called = false;
        let error = NonfsError::message("error").with_context(|| {
            called = true;
            "lazy context".to_string()
        });

        assert!(called);
        assert_eq!(error.get_context()[0], "lazy context");
    }

    #[test]
    fn test_error_display_with_multiple_contexts() {
        let error = NonfsError::message("root error")
            .context("first")
            .context("second");
        assert_eq!(error.to_string(), "first: second: root error");
    }

    #[test]
    fn test_display_not_found() {
        let error = NonfsError::new(ErrorKind::NotFound {
            path: "data/level1.json".to_string(),
            file_type: FileType::Internal,
        });
        assert_eq!(
            error.to_string(),
            "File not found: data/level1.json (Internal)"
        );
    }

    #[test]
    fn test_display_unsupported_operation() {
        let error = NonfsError::new(ErrorKind::UnsupportedOperation {
            operation: "write to",
            path: "config.json".to_string(),
            file_type: FileType::Classpath,
        });
        assert_eq!(
            error.to_string(),
            "Cannot write to a classpath file: config.json (Classpath)"
        );
    }

    #[test]
    fn test_display_destination_conflict() {
        let error = NonfsError::new(ErrorKind::DestinationConflict {
            from: "src (Local)".to_string(),
            to: "dst.txt (Local)".to_string(),
        });
        assert_eq!(
            error.to_string(),
            "Destination exists but is not a directory: dst.txt (Local) (copying src (Local))"
        );
    }

    #[test]
    fn test_error_source_io_failure() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let error = NonfsError::io("test.txt", io_err);
        assert!(error.source().is_some());
        assert_eq!(error.root_cause().to_string(), "access denied");
    }

    #[test]
    fn test_error_source_follows_cause() {
        let inner = NonfsError::io("a.txt", io::Error::other("disk on fire"));
        let outer = NonfsError::message("copy failed").caused_by(inner);
        assert_eq!(outer.source().unwrap().to_string(), "File error at a.txt: disk on fire");
        assert_eq!(outer.root_cause().to_string(), "disk on fire");
    }

    #[test]
    fn test_error_root_cause_message() {
        let error = NonfsError::message("test");
        assert_eq!(error.root_cause().to_string(), "test");
    }

    #[test]
    fn test_result_ext_chaining() {
        let result: NonfsResult<i32> = Err(Box::new(NonfsError::message("root")));
        let err = result
            .context("step 1")
            .context("step 2")
            .with_context(|| "step 3".to_string())
            .unwrap_err();
        assert_eq!(err.to_string(), "step 1: step 2: step 3: root");
    }

    #[test]
    fn test_result_ext_success_untouched() {
        let result: NonfsResult<i32> = Ok(42);
        assert_eq!(result.context("operation failed").unwrap(), 42);
    }

    #[test]
    fn test_err_and_bail_macros() {
        fn fails(name: &str) -> NonfsResult<()> {
            crate::bail!("bad name: {}", name)
        }
        let err = fails("x").unwrap_err();
        assert_eq!(err.to_string(), "bad name: x");

        let err = crate::err!("value {}", 3);
        assert!(matches!(err.kind(), ErrorKind::Message { message } if message == "value 3"));
    }

    #[test]
    fn test_debug_without_span_trace() {
        let error = NonfsError::message("something went wrong")
            .context("during file processing")
            .context("in batch job");

        expect![[r#"
            something went wrong
            ├─ during file processing
            └─ in batch job

        "#]]
        .assert_debug_eq(&error);
    }

    #[test]
    fn test_debug_nested_errors() {
        let inner_error = NonfsError::message("inner error").context("inner context");
        let outer_error = NonfsError::message("outer error")
            .context("outer context")
            .caused_by(inner_error);

        expect![[r#"
            outer error
            ├─ outer context
            └─ cause: inner error
               └─ inner context

        "#]]
        .assert_debug_eq(&outer_error);
    }

    #[test]
    fn test_debug_multiple_nested_errors() {
        let error_1 = NonfsError::message("error 1").context("context 1");
        let error_2 = NonfsError::message("error 2")
            .context("context 2")
            .caused_by(error_1);
        let error_3 = NonfsError::message("error 3")
            .context("context 3")
            .caused_by(error_2);

        expect![[r#"
            error 3
            ├─ context 3
            └─ cause: error 2
               ├─ context 2
               └─ cause: error 1
                  └─ context 1

        "#]]
        .assert_debug_eq(&error_3);
    }

    #[test]
    fn test_spantrace_includes_span_information() {
        let rendered = with_error_layer(|| {
            let operation_span = span!(tracing::Level::DEBUG, "copy_tree", entries = 42);
            let _guard = operation_span.enter();
            format!("{:?}", NonfsError::message("test error message"))
        });

        assert!(rendered.starts_with("test error message\nTrace: "));
        assert!(rendered.contains("copy_tree"));
        assert!(rendered.contains("entries=42"));
    }

    #[test]
    fn test_spantrace_empty_without_error_layer() {
        let error = NonfsError::message("plain");
        assert_eq!(format!("{:?}", error), "plain\n");
    }
}
