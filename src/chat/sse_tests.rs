use bytes::Bytes;
use futures::stream::StreamExt;

use super::event_stream;
use crate::chat::StreamEvent;

async fn collect_events(chunks: Vec<Result<Bytes, reqwest::Error>>) -> Vec<StreamEvent> {
    let mock_response = create_mock_response(chunks);
    let mut stream = event_stream(mock_response);

    let mut events = Vec::new();
    while let Some(result) = stream.next().await {
        events.push(result.expect("decoded event"));
    }
    events
}

fn single_chunk(data: &str) -> Vec<Result<Bytes, reqwest::Error>> {
    vec![Ok(Bytes::from(data.as_bytes().to_vec()))]
}

#[tokio::test]
async fn decodes_full_event_sequence() {
    let data = concat!(
        "data: {\"type\":\"setup\",\"conversation_id\":\"c-1\"}\n\n",
        "data: {\"type\":\"content\",\"content\":\"Hi\"}\n\n",
        "data: {\"type\":\"done\"}\n\n",
    );

    let events = collect_events(single_chunk(data)).await;

    assert_eq!(
        events,
        vec![
            StreamEvent::Setup {
                conversation_id: "c-1".into()
            },
            StreamEvent::Content {
                content: "Hi".into()
            },
            StreamEvent::Done { message_id: None },
        ]
    );
}

#[tokio::test]
async fn split_mid_line_matches_single_chunk_decode() {
    let data = concat!(
        "data: {\"type\":\"content\",\"content\":\"He\"}\n",
        "data: {\"type\":\"content\",\"content\":\"llo\"}\n",
    );
    let whole = collect_events(single_chunk(data)).await;

    // Split inside the first JSON payload.
    let bytes = data.as_bytes();
    let split = collect_events(vec![
        Ok(Bytes::from(bytes[..17].to_vec())),
        Ok(Bytes::from(bytes[17..].to_vec())),
    ])
    .await;

    assert_eq!(whole, split);
    assert_eq!(
        split,
        vec![
            StreamEvent::Content {
                content: "He".into()
            },
            StreamEvent::Content {
                content: "llo".into()
            },
        ]
    );
}

#[tokio::test]
async fn split_inside_multibyte_code_point() {
    let event = "data: {\"type\":\"content\",\"content\":\"caf\u{00e9} \u{2728}\"}\n";
    let bytes = event.as_bytes().to_vec();

    let sparkle_start = event.find('\u{2728}').unwrap();
    let split_in_sparkle = sparkle_start + 1;

    let events = collect_events(vec![
        Ok(Bytes::from(bytes[..split_in_sparkle].to_vec())),
        Ok(Bytes::from(bytes[split_in_sparkle..].to_vec())),
    ])
    .await;

    assert_eq!(
        events,
        vec![StreamEvent::Content {
            content: "caf\u{00e9} \u{2728}".into()
        }]
    );
}

#[tokio::test]
async fn byte_at_a_time_matches_single_chunk_decode() {
    let data = concat!(
        "data: {\"type\":\"setup\",\"conversation_id\":\"c-9\"}\n",
        "data: {\"type\":\"content\",\"content\":\"\u{00e9}t\u{00e9}\"}\n",
        "data: {\"type\":\"done\",\"message_id\":\"m-1\"}\n",
    );
    let whole = collect_events(single_chunk(data)).await;

    let trickle: Vec<Result<Bytes, reqwest::Error>> = data
        .as_bytes()
        .iter()
        .map(|b| Ok(Bytes::from(vec![*b])))
        .collect();
    let dribbled = collect_events(trickle).await;

    assert_eq!(whole, dribbled);
    assert_eq!(dribbled.len(), 3);
}

#[tokio::test]
async fn malformed_line_does_not_halt_decoding() {
    let data = concat!(
        "data: {\"type\":\"content\",\"content\":\"first\"}\n",
        "data: {not json\n",
        "data: {\"type\":\"content\",\"content\":\"second\"}\n",
    );

    let events = collect_events(single_chunk(data)).await;

    assert_eq!(
        events,
        vec![
            StreamEvent::Content {
                content: "first".into()
            },
            StreamEvent::Content {
                content: "second".into()
            },
        ]
    );
}

#[tokio::test]
async fn non_data_lines_are_ignored() {
    let data = concat!(
        ": keep-alive\n",
        "\n",
        "event: message\n",
        "data: {\"type\":\"content\",\"content\":\"kept\"}\n",
    );

    let events = collect_events(single_chunk(data)).await;

    assert_eq!(
        events,
        vec![StreamEvent::Content {
            content: "kept".into()
        }]
    );
}

#[tokio::test]
async fn unknown_event_types_are_skipped() {
    let data = concat!(
        "data: {\"type\":\"heartbeat\"}\n",
        "data: {\"type\":\"done\"}\n",
    );

    let events = collect_events(single_chunk(data)).await;

    assert_eq!(events, vec![StreamEvent::Done { message_id: None }]);
}

#[tokio::test]
async fn error_event_is_surfaced() {
    let data = "data: {\"type\":\"error\",\"content\":\"Failed to save message\"}\n";

    let events = collect_events(single_chunk(data)).await;

    assert_eq!(
        events,
        vec![StreamEvent::Error {
            content: "Failed to save message".into()
        }]
    );
}

fn create_mock_response(chunks: Vec<Result<Bytes, reqwest::Error>>) -> reqwest::Response {
    use http_body_util::StreamBody;
    use reqwest::Body;

    let frame_stream = futures::stream::iter(
        chunks
            .into_iter()
            .map(|chunk| chunk.map(hyper::body::Frame::data)),
    );

    let body = StreamBody::new(frame_stream);
    let body = Body::wrap(body);

    let http_response = http::Response::builder().status(200).body(body).unwrap();

    http_response.into()
}
