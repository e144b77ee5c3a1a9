use super::Message;
use super::MessageId;

#[derive(Debug)]
pub enum Action {
    CopyMessage(Message),
    CopyMessages(Vec<Message>),
    CopyText(String),
    RegenerateMessage(MessageId),
    SendMessage(String),
    SetModel(String),
    SetTemperature(String),
}
