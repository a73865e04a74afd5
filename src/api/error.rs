// ============================================================================
// Erreurs du client API
// ============================================================================
// CONCEPT RUST : thiserror
// - #[derive(Error)] génère l'implémentation de std::error::Error
// - #[error("...")] définit le message Display de chaque variante
// - #[source] chaîne l'erreur sous-jacente (reqwest, serde_json)
// ============================================================================

use thiserror::Error;

/// Échec d'un appel au backend
#[derive(Debug, Error)]
pub enum ApiError {
    /// Réponse HTTP hors 2xx
    #[error("HTTP {status} pour {url}")]
    Status { status: u16, url: String },

    /// Réseau injoignable, timeout, lecture du corps impossible
    #[error("échec de la requête vers {url} : {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Corps de réponse qui n'est pas le JSON attendu
    #[error("réponse illisible de {url} : {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// Le backend a répondu mais avec success = false (ou sans données)
    #[error("le backend n'a pas pu servir {endpoint}")]
    Unsuccessful { endpoint: String },

    /// Paramètre rejeté avant tout appel réseau
    #[error("argument invalide : {0}")]
    InvalidArgument(String),

    /// Aucune origine configurée
    #[error("aucune origine configurée pour {endpoint}")]
    NoOrigin { endpoint: String },
}

impl ApiError {
    /// Code HTTP si l'erreur vient d'une réponse non-2xx
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_accessor() {
        let err = ApiError::Status {
            status: 502,
            url: "http://localhost:8000/api/health".to_string(),
        };
        assert_eq!(err.status(), Some(502));
        assert!(err.to_string().contains("502"));

        assert_eq!(ApiError::InvalidArgument("days".to_string()).status(), None);
    }
}
