use vecprep_core::EmbeddingError;
use vecprep_embeddings::EmbeddingProviderError;

#[test]
fn provider_errors_map_to_embedding_errors() {
    let invalid: EmbeddingError =
        EmbeddingProviderError::InvalidResponse("expected 2 embeddings, got 1".to_string()).into();
    assert!(matches!(
        &invalid,
        EmbeddingError::InvalidResponse(message) if message == "expected 2 embeddings, got 1"
    ));

    let request: EmbeddingError =
        EmbeddingProviderError::Request("connection refused".to_string()).into();
    assert_eq!(
        request.to_string(),
        "Embedding provider error: connection refused"
    );

    let api: EmbeddingError = EmbeddingProviderError::Api {
        status: 401,
        message: "Incorrect API key provided".to_string(),
    }
    .into();
    assert_eq!(
        api.to_string(),
        "Embedding provider error: api error 401: Incorrect API key provided"
    );
}
