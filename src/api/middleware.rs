//! # Logging de cadenas de errores

use std::error::Error as StdError;

/// Registra la cadena completa de causas de un error
pub fn log_error_chain<E>(error: &E, context: Option<&str>)
where
    E: StdError + 'static,
{
    let error_chain = collect_chain(error);

    if let Some(ctx) = context {
        tracing::error!(
            context = %ctx,
            error_chain = ?error_chain,
            "Error with full chain (with context)"
        );
    } else {
        tracing::error!(error_chain = ?error_chain, "Error with full chain");
    }
}

fn collect_chain<E>(error: &E) -> Vec<String>
where
    E: StdError + 'static,
{
    let mut chain = Vec::new();
    let mut current: Option<&dyn StdError> = Some(error);

    while let Some(err) = current {
        chain.push(err.to_string());
        current = err.source();
    }

    chain
}

/// Extension trait para Results que registra la cadena de errores
///
/// ```ignore
/// collection
///     .find_one(filter)
///     .await
///     .log_error_context("loading student")?;
/// ```
pub trait ErrorLogExt<T, E> {
    fn log_error_context(self, context: &str) -> Result<T, E>;
}

impl<T, E> ErrorLogExt<T, E> for Result<T, E>
where
    E: StdError + 'static,
{
    fn log_error_context(self, context: &str) -> Result<T, E> {
        if let Err(ref error) = self {
            log_error_chain(error, Some(context));
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("exterior")]
    struct Outer(#[source] std::io::Error);

    #[test]
    fn chain_includes_sources() {
        let err = Outer(std::io::Error::new(std::io::ErrorKind::Other, "interior"));
        assert_eq!(collect_chain(&err), vec!["exterior", "interior"]);
    }

    #[test]
    fn ok_results_pass_through() {
        let ok: Result<u8, std::io::Error> = Ok(7);
        assert_eq!(ok.log_error_context("nada").unwrap(), 7);
    }
}
