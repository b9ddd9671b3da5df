use serde_json::Value;

use crate::types::Direction;

#[derive(Debug, PartialEq)]
pub enum ParsedClientMessage {
    Input { dir: Direction },
    Reset { seed: Option<u32> },
    Ping { t: f64 },
}

pub fn parse_client_message(raw: &str) -> Option<ParsedClientMessage> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;
    let message_type = object.get("type")?.as_str()?;

    match message_type {
        "input" => {
            let dir = Direction::parse_move(object.get("dir")?.as_str()?)?;
            Some(ParsedClientMessage::Input { dir })
        }
        "reset" => {
            let seed = parse_optional_seed(object.get("seed"))?;
            Some(ParsedClientMessage::Reset { seed })
        }
        "ping" => {
            let t = object.get("t")?.as_f64()?;
            if !t.is_finite() {
                return None;
            }
            Some(ParsedClientMessage::Ping { t })
        }
        _ => None,
    }
}

/// `Some(None)` for a missing or null seed, `None` when the value is present
/// but unusable.
fn parse_optional_seed(value: Option<&Value>) -> Option<Option<u32>> {
    let Some(value) = value else {
        return Some(None);
    };
    if value.is_null() {
        return Some(None);
    }
    if let Some(number) = value.as_u64() {
        return u32::try_from(number).ok().map(Some);
    }
    if let Some(number) = value.as_f64() {
        if number.is_finite() && number >= 0.0 {
            let floored = number.floor();
            if floored <= u32::MAX as f64 {
                return Some(Some(floored as u32));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_input_message() {
        assert_eq!(
            parse_client_message(r#"{"type":"input","dir":"left"}"#),
            Some(ParsedClientMessage::Input {
                dir: Direction::Left
            })
        );
    }

    #[test]
    fn parse_input_accepts_none_direction() {
        assert_eq!(
            parse_client_message(r#"{"type":"input","dir":"none"}"#),
            Some(ParsedClientMessage::Input {
                dir: Direction::None
            })
        );
    }

    #[test]
    fn parse_input_rejects_invalid_or_missing_direction() {
        assert!(parse_client_message(r#"{"type":"input","dir":"invalid"}"#).is_none());
        assert!(parse_client_message(r#"{"type":"input"}"#).is_none());
        assert!(parse_client_message(r#"{"type":"input","dir":3}"#).is_none());
    }

    #[test]
    fn parse_reset_with_and_without_seed() {
        assert_eq!(
            parse_client_message(r#"{"type":"reset"}"#),
            Some(ParsedClientMessage::Reset { seed: None })
        );
        assert_eq!(
            parse_client_message(r#"{"type":"reset","seed":null}"#),
            Some(ParsedClientMessage::Reset { seed: None })
        );
        assert_eq!(
            parse_client_message(r#"{"type":"reset","seed":42}"#),
            Some(ParsedClientMessage::Reset { seed: Some(42) })
        );
        assert_eq!(
            parse_client_message(r#"{"type":"reset","seed":7.9}"#),
            Some(ParsedClientMessage::Reset { seed: Some(7) })
        );
    }

    #[test]
    fn parse_reset_rejects_out_of_range_seeds() {
        assert!(parse_client_message(r#"{"type":"reset","seed":-1}"#).is_none());
        assert!(parse_client_message(r#"{"type":"reset","seed":4294967296}"#).is_none());
        assert!(parse_client_message(r#"{"type":"reset","seed":1e100}"#).is_none());
        assert!(parse_client_message(r#"{"type":"reset","seed":"12"}"#).is_none());
    }

    #[test]
    fn parse_ping_requires_finite_number() {
        assert_eq!(
            parse_client_message(r#"{"type":"ping","t":12.5}"#),
            Some(ParsedClientMessage::Ping { t: 12.5 })
        );
        assert!(parse_client_message(r#"{"type":"ping","t":"soon"}"#).is_none());
    }

    #[test]
    fn unknown_or_malformed_messages_are_rejected() {
        assert!(parse_client_message(r#"{"type":"hello"}"#).is_none());
        assert!(parse_client_message("[1,2]").is_none());
        assert!(parse_client_message("not json").is_none());
    }
}
