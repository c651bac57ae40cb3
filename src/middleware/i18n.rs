// src/middleware/i18n.rs

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

const DEFAULT_LANG: &str = "en";

// Nosso extrator de idioma
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale(pub String);

impl Default for Locale {
    fn default() -> Self {
        Locale(DEFAULT_LANG.to_string())
    }
}

impl Locale {
    /// "es-MX,es;q=0.9" -> "es"
    pub fn from_header(header_str: &str) -> Self {
        accept_language::parse(header_str)
            .first()
            .and_then(|tag| tag.split('-').next())
            .map(|primary| Locale(primary.to_lowercase()))
            .unwrap_or_default()
    }
}

impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let locale = parts
            .headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|header_value| header_value.to_str().ok())
            .map(Locale::from_header)
            .unwrap_or_default();

        Ok(locale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_the_primary_subtag() {
        assert_eq!(Locale::from_header("es-MX,es;q=0.9,en;q=0.8"), Locale("es".into()));
        assert_eq!(Locale::from_header("pt-BR"), Locale("pt".into()));
    }

    #[test]
    fn empty_header_falls_back_to_default() {
        assert_eq!(Locale::from_header(""), Locale::default());
    }
}
