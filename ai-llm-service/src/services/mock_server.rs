//! Local HTTP server standing in for a provider in tests.

use axum::Router;

/// Serves `app` on an ephemeral localhost port and returns its base URL.
pub(crate) async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// A response body delivered in the given chunks, which may split lines.
pub(crate) fn chunked(chunks: Vec<&'static str>) -> axum::body::Body {
    axum::body::Body::from_stream(futures::stream::iter(
        chunks.into_iter().map(Ok::<_, std::convert::Infallible>),
    ))
}
