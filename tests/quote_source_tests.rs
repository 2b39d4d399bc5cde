use pulsetrack::services::quote_source::{MockQuoteSource, QuoteSource};

#[tokio::test]
async fn quote_fields_are_coherent() {
    let source = MockQuoteSource::new();

    let q = source.get_quote("aapl").await.unwrap();

    assert_eq!(q.symbol, "AAPL");
    assert!(q.price > 0.0);
    assert!(q.high >= q.price);
    assert!(q.low <= q.price);
    assert!(q.low > 0.0);
    assert!(q.volume > 0);
}

#[tokio::test]
async fn consecutive_quotes_follow_a_bounded_walk() {
    let source = MockQuoteSource::new();

    let first = source.get_quote("MSFT").await.unwrap();
    let second = source.get_quote("MSFT").await.unwrap();

    // Single step is at most 1% plus rounding.
    let drift = (second.price - first.price).abs() / first.price;
    assert!(drift < 0.02, "drift {drift} out of range");
}

#[tokio::test]
async fn bulk_quotes_preserve_order_and_length() {
    let source = MockQuoteSource::new();

    let symbols = vec!["AAPL".to_string(), "MSFT".to_string(), "TSLA".to_string()];
    let quotes = source.get_bulk_quotes(&symbols).await.unwrap();

    assert_eq!(quotes.len(), 3);
    assert_eq!(quotes[0].symbol, "AAPL");
    assert_eq!(quotes[2].symbol, "TSLA");
}

#[tokio::test]
async fn historical_data_respects_limit() {
    let source = MockQuoteSource::new();

    let bars = source.get_historical_data("AAPL", "1day", 30).await.unwrap();

    assert_eq!(bars.len(), 30);
    for bar in &bars {
        assert!(bar.high >= bar.close);
        assert!(bar.low <= bar.close);
        assert!(bar.low > 0.0);
    }
}

#[tokio::test]
async fn search_matches_symbol_or_name() {
    let source = MockQuoteSource::new();

    let by_name = source.search_symbols("apple").await.unwrap();
    assert!(by_name.iter().any(|m| m.symbol == "AAPL"));

    let by_symbol = source.search_symbols("msf").await.unwrap();
    assert!(by_symbol.iter().any(|m| m.symbol == "MSFT"));

    let none = source.search_symbols("zzzz").await.unwrap();
    assert!(none.is_empty());
}
