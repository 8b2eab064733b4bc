use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sitegraph::crawler::{Crawler, LookupTable};
use sitegraph::output::{DotWriter, JsonWriter, ResultWriter};

async fn serve(server: &MockServer, route: &str, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

fn crawler() -> Crawler {
    Crawler::http(5, Duration::from_secs(5))
}

#[tokio::test]
async fn test_circular_site() -> Result<(), Box<dyn std::error::Error>> {
    let server = MockServer::start().await;
    let index = r#"<html><head><link rel="stylesheet" href="site.css"></head><body>
        <a href="a.html">A</a> <a href="b.html#top">B</a> <a href="b.html">B again</a>
        </body></html>"#;
    serve(&server, "/", 200, index).await;
    serve(&server, "/a.html", 200, r#"<a href="/">Home</a><img src="/img/a.png">"#).await;
    serve(&server, "/b.html", 200, r#"<a href="https://example.com/">Away</a>"#).await;

    let root = format!("{}/", server.uri());
    let result = crawler().crawl(&root).await?;

    let mut out = Vec::new();
    JsonWriter { pretty: true }.write(&mut out, &result)?;
    let actual: serde_json::Value = serde_json::from_slice(&out)?;

    let expected = serde_json::json!({
        (root.clone()): {
            "links": [
                format!("{root}a.html"),
                format!("{root}b.html"),
                format!("{root}b.html")
            ],
            "assets": [format!("{root}site.css")]
        },
        (format!("{root}a.html")): {
            "links": [root.clone()],
            "assets": [format!("{root}img/a.png")]
        },
        (format!("{root}b.html")): {
            "links": [],
            "assets": []
        }
    });
    assert_eq!(actual, expected);

    // every page was requested exactly once
    let requests = server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_broken_link() -> Result<(), Box<dyn std::error::Error>> {
    let server = MockServer::start().await;
    let index = r#"<a href="/ok.html">ok</a><a href="/missing.html">missing</a>"#;
    serve(&server, "/", 200, index).await;
    serve(&server, "/ok.html", 200, "<p>fine</p>").await;
    serve(&server, "/missing.html", 404, "gone").await;

    let result = crawler().crawl(&server.uri()).await?;

    let links: Vec<_> = result.links(result.root()).collect();
    assert_eq!(links.len(), 2);
    assert!(links[0].error().is_none());
    assert!(links[1].error().is_some(), "expect page error for broken link");

    let table: &LookupTable = result.lookup_table();
    let missing = &table[&format!("{}/missing.html", server.uri())];
    assert_eq!(missing.error.as_deref(), Some("non 200 status code received: 404"));
    assert!(missing.links.is_none());
    Ok(())
}

#[tokio::test]
async fn test_dot_output_of_live_site() -> Result<(), Box<dyn std::error::Error>> {
    let server = MockServer::start().await;
    let index = r#"<a href="/x">x</a><a href="/x">x</a><script src="/app.js"></script>"#;
    serve(&server, "/", 200, index).await;
    serve(&server, "/x", 200, r#"<a href="/">back</a>"#).await;

    let result = crawler().crawl(&server.uri()).await?;
    let mut out = Vec::new();
    DotWriter.write(&mut out, &result)?;
    let dot = String::from_utf8(out)?;

    let host = format!("digraph \"{}\" {{", result.root().url().host_str().unwrap_or_default());
    assert!(dot.starts_with(&host), "digraph is named after the host");
    assert_eq!(dot.matches("shape = record").count(), 2);
    assert!(dot.contains("label = \"2\""), "repeated link is a weighted edge");
    assert!(dot.contains("app.js\\l"));
    Ok(())
}
