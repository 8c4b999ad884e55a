use typeahead_web::providers::parsers::{
    parse_bing, parse_brave, parse_duckduckgo, parse_ecosia, parse_google, parse_yahoo,
};

#[test]
fn google_jsonp_body() {
    let body = r#")]}'
window.google.ac.h([[["cat<b>s</b>",0,[512,433]],["cat<b> food</b>",0,[512]],["CATS",0,[512]],["cat &amp; mouse",0,[512]]],{"q":"x","t":{"bpc":false}}])"#;
    assert_eq!(parse_google(body), vec!["cats", "cat food", "cat & mouse"]);
}

#[test]
fn bing_suggestion_groups() {
    let body = r#"{
        "_type": "Suggestions",
        "queryContext": {"originalQuery": "cat"},
        "suggestionGroups": [{
            "name": "Web",
            "searchSuggestions": [
                {"url": "https://www.bing.com/search?q=cats", "displayText": "cats", "query": "cats"},
                {"url": "https://www.bing.com/search?q=catfish", "query": "catfish"},
                {"displayText": "cat breeds", "query": "cat breeds"}
            ]
        }]
    }"#;
    assert_eq!(parse_bing(body), vec!["cats", "cat breeds"]);
}

#[test]
fn yahoo_gossip_results() {
    let body = r#"{"gossip":{"qry":"cat","gprid":"abc","results":[{"key":"cat","mrk":1},{"key":"catalina"},{"nokey":true}]}}"#;
    assert_eq!(parse_yahoo(body), vec!["cat", "catalina"]);
}

#[test]
fn duckduckgo_phrases() {
    let body = r#"[{"phrase":"cats"},{"phrase":"cat"},{"other":"x"},{"phrase":"Cat"}]"#;
    assert_eq!(parse_duckduckgo(body), vec!["cats", "cat"]);
}

#[test]
fn brave_mixes_plain_and_entity_entries() {
    let body = r#"["cat",[
        {"is_entity":false,"q":"cat food"},
        {"is_entity":true,"q":"cat","name":"Cat","desc":"Small domesticated carnivore"},
        "cat toys",
        {"is_entity":false}
    ]]"#;
    assert_eq!(parse_brave(body), vec!["cat food", "Cat", "cat toys"]);
}

#[test]
fn ecosia_suggestion_strings() {
    let body = r#"{"query":"cat","suggestions":["cats","cat games",42,"cats"]}"#;
    assert_eq!(parse_ecosia(body), vec!["cats", "cat games"]);
}

#[test]
fn malformed_bodies_yield_nothing() {
    let bodies = [
        "",
        "not json",
        "{",
        "null",
        "[]",
        "{}",
        r#"{"suggestionGroups":"oops"}"#,
        r#"["cat"]"#,
        "<html><body>503</body></html>",
    ];
    let parsers: [fn(&str) -> Vec<String>; 6] = [
        parse_google,
        parse_bing,
        parse_yahoo,
        parse_duckduckgo,
        parse_brave,
        parse_ecosia,
    ];
    for body in bodies {
        for parse in parsers {
            assert!(parse(body).is_empty(), "expected empty for {body:?}");
        }
    }
}
