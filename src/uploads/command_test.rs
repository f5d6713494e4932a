use serde_json::json;

use super::*;

fn wire_value(command: &UploadCommand) -> Value {
    let text = command.to_wire().expect("command should encode");
    serde_json::from_str(&text).expect("wire text should be JSON")
}

fn data(value: Value) -> CommandData {
    value.as_object().cloned().expect("object payload")
}

#[test]
fn unit_commands_carry_only_the_type() {
    assert_eq!(UploadCommand::subscribe().to_wire().unwrap(), r#"{"type":"subscribe"}"#);
    assert_eq!(UploadCommand::list().to_wire().unwrap(), r#"{"type":"list"}"#);
}

#[test]
fn retrieve_and_delete_carry_instance_id() {
    assert_eq!(
        wire_value(&UploadCommand::retrieve("42")),
        json!({"type": "retrieve", "instance_id": "42"})
    );
    assert_eq!(
        wire_value(&UploadCommand::delete("42")),
        json!({"type": "delete", "instance_id": "42"})
    );
}

#[test]
fn create_carries_only_data() {
    let cmd = UploadCommand::create(data(json!({"name": "receipt.png", "pages": 2})));
    assert_eq!(
        wire_value(&cmd),
        json!({"type": "create", "data": {"name": "receipt.png", "pages": 2}})
    );
}

#[test]
fn update_keeps_type_first_and_nested_data() {
    let cmd = UploadCommand::update("7", data(json!({"title": "scan"})));
    assert_eq!(
        cmd.to_wire().unwrap(),
        r#"{"type":"update","instance_id":"7","data":{"title":"scan"}}"#
    );
}

#[test]
fn question_carries_instance_and_text() {
    let cmd = UploadCommand::question("7", "What is the total?");
    assert_eq!(
        wire_value(&cmd),
        json!({"type": "question", "instance_id": "7", "question": "What is the total?"})
    );
}

#[test]
fn kind_matches_wire_discriminator() {
    let commands = [
        UploadCommand::subscribe(),
        UploadCommand::list(),
        UploadCommand::retrieve("1"),
        UploadCommand::delete("1"),
        UploadCommand::create(CommandData::new()),
        UploadCommand::update("1", CommandData::new()),
        UploadCommand::question("1", "?"),
    ];
    for cmd in &commands {
        assert_eq!(wire_value(cmd)["type"], cmd.kind());
    }
}

#[test]
fn wire_text_parses_back_into_command() {
    let parsed: UploadCommand =
        serde_json::from_str(r#"{"type":"retrieve","instance_id":"abc"}"#).expect("decode");
    assert_eq!(parsed, UploadCommand::retrieve("abc"));
}
