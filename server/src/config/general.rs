use std::net::SocketAddr;

use serde::{ Deserialize, Deserializer, de::Unexpected };

use common::server::CancelBehaviour;

#[derive(Debug, Deserialize)]
pub struct General {
    #[serde(deserialize_with = "deserialize_socket")]
    pub socket: SocketAddr,

    /// Sent along with configs broadcast after an update.
    #[serde(deserialize_with = "deserialize_push_behaviour")]
    pub push_behaviour: CancelBehaviour,
}

fn deserialize_socket<'de, D>(d: D) -> Result<SocketAddr, D::Error> where D: Deserializer<'de> {
    let s = String::deserialize(d)?;
    match s.parse::<SocketAddr>() {
        Ok(a) => Ok(a),
        Err(e) => Err(serde::de::Error::invalid_value(Unexpected::Str(&s), &format!("to be host:port. (general.socket) {e}").as_str())),
    }
}

fn deserialize_push_behaviour<'de, D>(d: D) -> Result<CancelBehaviour, D::Error> where D: Deserializer<'de> {
    match String::deserialize(d)?.to_lowercase().as_str() {
        "always" => Ok(CancelBehaviour::Always),
        "if_unequal" => Ok(CancelBehaviour::IfUnequal),
        "never" => Ok(CancelBehaviour::Never),
        invalid => Err(serde::de::Error::invalid_value(Unexpected::Str(invalid), &"always, if_unequal or never. (general.push_behaviour)")),
    }
}
