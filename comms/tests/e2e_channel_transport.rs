use comms::{
    command::{self, ClientCommand},
    event::{self, ServerEvent},
    transport,
};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message as WsMessage;

#[tokio::test]
async fn assert_channel_transport() {
    // bind to an ephemeral port so parallel test runs do not collide
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("could not bind to a port");
    let addr = listener.local_addr().expect("could not read local addr");

    let (server_collected_commands, client_collected_events) = tokio::join!(
        execute_server(listener),
        execute_client(format!("ws://{}", addr))
    );

    assert!(server_collected_commands.is_ok());
    assert!(client_collected_events.is_ok());

    assert_eq!(
        server_collected_commands.unwrap(),
        vec![
            ClientCommand::TypingStart(command::TypingStartCommand {
                room_id: "room-1".into(),
            }),
            ClientCommand::SendMessage(command::SendMessageCommand {
                room_id: "room-1".into(),
                content: "content-1".into(),
            }),
        ]
    );

    assert_eq!(
        client_collected_events.unwrap(),
        vec![
            ServerEvent::RoomsUpdate(Vec::default()),
            ServerEvent::TypingUpdate(event::TypingUpdateEvent {
                room_id: "room-1".into(),
                users: Vec::default(),
            }),
        ]
    );
}

async fn execute_server(listener: TcpListener) -> anyhow::Result<Vec<ClientCommand>> {
    // accept the only client connection we will have
    let tcp_stream = match listener.accept().await {
        Ok((tcp_stream, _addr)) => tcp_stream,
        Err(e) => return Err(anyhow::anyhow!("failed to accept client: {}", e)),
    };

    let mut ws_stream = tokio_tungstenite::accept_async(tcp_stream).await?;
    // store commands received from the client
    let mut collected_commands = Vec::new();

    // greet the client with a couple of pushed events
    let events = vec![
        ServerEvent::RoomsUpdate(Vec::default()),
        ServerEvent::TypingUpdate(event::TypingUpdateEvent {
            room_id: "room-1".into(),
            users: Vec::default(),
        }),
    ];
    for event in events {
        ws_stream
            .send(WsMessage::Text(serde_json::to_string(&event)?))
            .await?;
    }

    // listen for command frames from the client until the channel is closed
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(WsMessage::Text(text)) => {
                collected_commands.push(serde_json::from_str::<ClientCommand>(&text)?)
            }
            Ok(WsMessage::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => return Err(anyhow::anyhow!("failed to read command: {}", e)),
        }
    }

    Ok(collected_commands)
}

async fn execute_client(ws_url: String) -> anyhow::Result<Vec<ServerEvent>> {
    let (mut event_stream, mut command_writer) =
        transport::channel::connect(&ws_url, "test-token").await?;
    // store events received from the server
    let mut collected_events = Vec::new();

    // read the two greeting events pushed by the server
    for _ in 0..2 {
        match event_stream.next().await {
            // server has sent a valid event which we could read and parse
            Some(Ok(event)) => collected_events.push(event),
            // server has sent an event which we could not read or parse
            // could be a bug in the server, malicious server, breaking api changes etc.
            Some(Err(e)) => return Err(anyhow::anyhow!("could not parse event: {}", e)),
            // server has closed the channel, return an error
            None => return Err(anyhow::anyhow!("server closed the channel")),
        }
    }

    // send some commands to the server
    command_writer
        .write(&ClientCommand::TypingStart(command::TypingStartCommand {
            room_id: "room-1".into(),
        }))
        .await?;

    command_writer
        .write(&ClientCommand::SendMessage(command::SendMessageCommand {
            room_id: "room-1".into(),
            content: "content-1".into(),
        }))
        .await?;

    command_writer.close().await?;

    Ok(collected_events)
}
