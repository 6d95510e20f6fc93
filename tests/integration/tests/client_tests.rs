//! End-to-end client tests
//!
//! Each test starts its own fake gateway + REST server on an ephemeral port.
//!
//! Run with: cargo test -p integration-tests --test client_tests

use std::sync::Arc;

use bot_client::{
    ClientError, CommandArgs, CommandDeclaration, CommandOption, CommandResult, GatewayEventType,
    GatewayMessage, HandlerResult, IncidentKind, InvocationContext, OptionKind, Presence, Status,
};
use bot_common::{AppError, BotToken};
use bot_gateway::GatewayError;
use bot_rest::{ApplicationCommandsApi, RestClient, RestError};
use integration_tests::{
    client_for, client_with_token, message_create, slash_invocation, wait_until, CollectingSink,
    FakeConfig, FakeDiscord,
};
use parking_lot::Mutex;
use serde_json::json;

async fn ping(ctx: InvocationContext, _args: CommandArgs) -> CommandResult {
    ctx.reply("Pong!").await
}

async fn echo(ctx: InvocationContext, args: CommandArgs) -> CommandResult {
    let text = args.str("text")?.to_string();
    ctx.reply(text).await
}

fn echo_declaration() -> CommandDeclaration {
    CommandDeclaration::chat_input("echo", "Repeat text").option(
        CommandOption::new("text", OptionKind::String)
            .describe("Text to repeat")
            .required(),
    )
}

// ============================================================================
// Session
// ============================================================================

#[tokio::test]
async fn test_identifies_after_hello_and_heartbeats() {
    let fake = FakeDiscord::start_with_config(FakeConfig {
        heartbeat_interval_ms: 50,
        ..FakeConfig::default()
    })
    .await
    .unwrap();
    let incidents = Arc::new(CollectingSink::default());
    let client = Arc::new(client_for(&fake, &incidents).build().unwrap());

    let runner = client.clone();
    let run = tokio::spawn(async move { runner.run().await });

    wait_until("three heartbeats", || fake.received_op(1).len() >= 3)
        .await
        .unwrap();

    let received = fake.received();
    assert_eq!(received[0]["op"], 2, "identify must be the first frame");
    assert_eq!(received[0]["d"]["token"], "test-token");
    assert_eq!(received[0]["d"]["intents"], 16);
    assert_eq!(fake.received_op(2).len(), 1);

    // READY carried sequence 1; later heartbeats report it
    assert_eq!(fake.received_op(1).last().unwrap()["d"], 1);
    assert_eq!(client.session().application_id().map(u64::from), Some(5));

    client.shutdown_handle().shutdown().await;
    run.await.unwrap().unwrap();

    wait_until("close frame", || fake.client_closes() == 1)
        .await
        .unwrap();
    assert!(incidents.incidents().is_empty());
}

#[tokio::test]
async fn test_dispatches_reach_handlers_in_order() {
    let fake = FakeDiscord::start().await.unwrap();
    let incidents = Arc::new(CollectingSink::default());
    let seen = Arc::new(Mutex::new(Vec::new()));

    let sink = seen.clone();
    let client = Arc::new(
        client_for(&fake, &incidents)
            .on(GatewayEventType::MessageCreate, move |event: Arc<GatewayMessage>| {
                let sink = sink.clone();
                async move {
                    let content = event.d["content"].as_str().unwrap_or_default().to_string();
                    sink.lock().push((event.s, content));
                    HandlerResult::Ok(())
                }
            })
            .build()
            .unwrap(),
    );
    // MESSAGE_CREATE needs the message intents
    assert_eq!(client.session().options().intents.bits(), 16 | 55_824);

    let runner = client.clone();
    let run = tokio::spawn(async move { runner.run().await });
    wait_until("READY", || client.session().ready().is_some())
        .await
        .unwrap();

    for (i, content) in ["one", "two", "three"].iter().enumerate() {
        fake.dispatch("MESSAGE_CREATE", message_create(i as u64, content))
            .unwrap();
    }
    fake.send_raw("this is not json").unwrap();
    fake.dispatch("TYPING_START", json!({})).unwrap();

    wait_until("three messages", || seen.lock().len() == 3)
        .await
        .unwrap();
    wait_until("typing dispatch", || client.session().sequence() == Some(5))
        .await
        .unwrap();

    assert_eq!(
        *seen.lock(),
        vec![
            (Some(2), "one".to_string()),
            (Some(3), "two".to_string()),
            (Some(4), "three".to_string()),
        ]
    );
    assert_eq!(incidents.of_kind(IncidentKind::DecodeSkip).len(), 1);

    client.shutdown_handle().shutdown().await;
    run.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_presence_update_is_sent() {
    let fake = FakeDiscord::start().await.unwrap();
    let incidents = Arc::new(CollectingSink::default());
    let client = Arc::new(client_for(&fake, &incidents).build().unwrap());

    let runner = client.clone();
    let run = tokio::spawn(async move { runner.run().await });
    wait_until("READY", || client.session().ready().is_some())
        .await
        .unwrap();

    client
        .update_presence(Presence::now(Status::Dnd).with_afk(true))
        .await
        .unwrap();
    wait_until("presence update", || fake.received_op(3).len() == 1)
        .await
        .unwrap();

    let update = &fake.received_op(3)[0]["d"];
    assert_eq!(update["status"], "dnd");
    assert_eq!(update["afk"], true);

    client.shutdown_handle().shutdown().await;
    run.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_rejected_token_ends_with_close_code() {
    let fake = FakeDiscord::start().await.unwrap();
    let incidents = Arc::new(CollectingSink::default());
    let client = client_with_token(&fake, "wrong-token", &incidents)
        .build()
        .unwrap();

    let err = client.run().await.unwrap_err();
    match &err {
        ClientError::Gateway(e) => assert_eq!(e.close_code().map(|c| c.as_u16()), Some(4004)),
        other => panic!("unexpected error: {other}"),
    }
    assert!(matches!(AppError::from(err), AppError::InvalidToken));
    assert_eq!(incidents.of_kind(IncidentKind::ConnectionLost).len(), 1);
}

#[tokio::test]
async fn test_reconnect_request_ends_session() {
    let fake = FakeDiscord::start().await.unwrap();
    let incidents = Arc::new(CollectingSink::default());
    let client = Arc::new(client_for(&fake, &incidents).build().unwrap());

    let runner = client.clone();
    let run = tokio::spawn(async move { runner.run().await });
    wait_until("READY", || client.session().ready().is_some())
        .await
        .unwrap();

    fake.send_json(&json!({"op": 7, "d": null, "s": null, "t": null}))
        .unwrap();

    let err = run.await.unwrap().unwrap_err();
    assert!(matches!(
        err,
        ClientError::Gateway(GatewayError::ConnectionLost { .. })
    ));
    assert!(!client.session().is_running());
    // A session is single use
    assert!(matches!(
        client.run().await,
        Err(ClientError::Gateway(GatewayError::AlreadyStarted))
    ));
}

#[tokio::test]
async fn test_unacknowledged_heartbeats_end_session() {
    let fake = FakeDiscord::start_with_config(FakeConfig {
        heartbeat_interval_ms: 30,
        ack_heartbeats: false,
        ..FakeConfig::default()
    })
    .await
    .unwrap();
    let incidents = Arc::new(CollectingSink::default());
    let client = client_for(&fake, &incidents)
        .max_missed_acks(Some(2))
        .build()
        .unwrap();

    let err = client.run().await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Gateway(GatewayError::ConnectionLost { close_code: None, .. })
    ));
    assert_eq!(fake.received_op(1).len(), 2);
}

#[tokio::test]
async fn test_unreachable_gateway() {
    let incidents = Arc::new(CollectingSink::default());
    let fake = FakeDiscord::start().await.unwrap();
    let client = client_for(&fake, &incidents)
        .gateway_url("ws://127.0.0.1:1/gateway")
        .build()
        .unwrap();

    let err = client.run().await.unwrap_err();
    assert!(matches!(err, ClientError::Gateway(GatewayError::Connection(_))));
    assert_eq!(incidents.of_kind(IncidentKind::Connection).len(), 1);
}

// ============================================================================
// Commands
// ============================================================================

#[tokio::test]
async fn test_commands_reconciled_on_ready() {
    let fake = FakeDiscord::start_with_config(FakeConfig {
        remote_commands: vec!["a".to_string(), "b".to_string()],
        ..FakeConfig::default()
    })
    .await
    .unwrap();
    let incidents = Arc::new(CollectingSink::default());
    let client = Arc::new(
        client_for(&fake, &incidents)
            .command(CommandDeclaration::chat_input("b", "Kept"), ping)
            .unwrap()
            .command(CommandDeclaration::chat_input("c", "New"), ping)
            .unwrap()
            .build()
            .unwrap(),
    );
    let mut reports = client.sync_reports().unwrap();

    let runner = client.clone();
    let run = tokio::spawn(async move { runner.run().await });

    reports.wait_for(Option::is_some).await.unwrap();
    let report = reports.borrow().clone().unwrap();

    assert!(report.is_clean());
    assert_eq!(report.created.len(), 1);
    assert_eq!(report.created[0].name, "c");
    assert_eq!(report.deleted[0].name, "a");
    assert_eq!(report.unchanged[0].name, "b");
    assert_eq!(fake.command_names(), vec!["b", "c"]);

    let calls = fake.rest_calls();
    assert_eq!(
        calls,
        vec![
            "GET /applications/5/commands".to_string(),
            "POST /applications/5/commands c".to_string(),
            "GET /applications/5/commands".to_string(),
            "DELETE /applications/5/commands/1000".to_string(),
        ]
    );

    client.shutdown_handle().shutdown().await;
    run.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_create_payload_shape() {
    let fake = FakeDiscord::start().await.unwrap();
    let incidents = Arc::new(CollectingSink::default());
    let client = Arc::new(
        client_for(&fake, &incidents)
            .command(echo_declaration(), echo)
            .unwrap()
            .build()
            .unwrap(),
    );
    let mut reports = client.sync_reports().unwrap();

    let runner = client.clone();
    let run = tokio::spawn(async move { runner.run().await });
    reports.wait_for(Option::is_some).await.unwrap();

    let commands = fake.commands();
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0]["name"], "echo");
    assert_eq!(commands[0]["type"], 1);
    assert_eq!(commands[0]["description"], "Repeat text");
    assert_eq!(
        commands[0]["options"],
        json!([{"name": "text", "description": "Text to repeat", "type": 3, "required": true}])
    );

    client.shutdown_handle().shutdown().await;
    run.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_invocations_routed_and_answered() {
    let fake = FakeDiscord::start().await.unwrap();
    let incidents = Arc::new(CollectingSink::default());
    let messages = Arc::new(Mutex::new(0usize));

    let counter = messages.clone();
    let client = Arc::new(
        client_for(&fake, &incidents)
            .command(echo_declaration(), echo)
            .unwrap()
            .command(CommandDeclaration::chat_input("ping", "Ping"), ping)
            .unwrap()
            .on("MESSAGE_CREATE", move |_event: Arc<GatewayMessage>| {
                let counter = counter.clone();
                async move {
                    *counter.lock() += 1;
                    HandlerResult::Ok(())
                }
            })
            .build()
            .unwrap(),
    );
    let mut reports = client.sync_reports().unwrap();

    let runner = client.clone();
    let run = tokio::spawn(async move { runner.run().await });
    reports.wait_for(Option::is_some).await.unwrap();

    fake.dispatch(
        "INTERACTION_CREATE",
        slash_invocation(900, 5, "echo", json!([{"name": "text", "type": 3, "value": "hi there"}])),
    )
    .unwrap();
    fake.dispatch("INTERACTION_CREATE", slash_invocation(901, 5, "ping", json!([])))
        .unwrap();

    wait_until("two callbacks", || fake.callbacks().len() == 2)
        .await
        .unwrap();
    let callbacks = fake.callbacks();
    assert_eq!(callbacks[0].0, "900");
    assert_eq!(callbacks[0].1, "token-900");
    assert_eq!(callbacks[0].2, json!({"type": 4, "data": {"content": "hi there"}}));
    assert_eq!(callbacks[1].2["data"]["content"], "Pong!");

    // Unknown commands are reported and the session keeps going
    fake.dispatch("INTERACTION_CREATE", slash_invocation(902, 5, "missing", json!([])))
        .unwrap();
    // So are handler failures (echo without its argument)
    fake.dispatch("INTERACTION_CREATE", slash_invocation(903, 5, "echo", json!([])))
        .unwrap();
    fake.dispatch("MESSAGE_CREATE", message_create(1, "still here"))
        .unwrap();

    wait_until("message after failures", || *messages.lock() == 1)
        .await
        .unwrap();

    let unknown = incidents.of_kind(IncidentKind::NoSuchCommand);
    assert_eq!(unknown.len(), 1);
    assert_eq!(unknown[0].subject.as_deref(), Some("chat-input:missing"));
    let failed = incidents.of_kind(IncidentKind::HandlerError);
    assert_eq!(failed.len(), 1);
    assert!(failed[0].detail.contains("text"));
    assert_eq!(fake.callbacks().len(), 2);
    assert!(client.session().is_running());

    client.shutdown_handle().shutdown().await;
    run.await.unwrap().unwrap();
}

// ============================================================================
// REST
// ============================================================================

#[tokio::test]
async fn test_rest_rejects_bad_token() {
    let fake = FakeDiscord::start().await.unwrap();
    let rest = RestClient::with_options(
        &fake.rest_base(),
        &BotToken::bot("nope"),
        "integration-tests",
        std::time::Duration::from_secs(5),
    )
    .unwrap();

    let api = ApplicationCommandsApi::new(Arc::new(rest), 5.into());
    assert!(matches!(api.list().await, Err(RestError::Unauthorized)));
    assert!(fake.rest_calls().is_empty());
}
