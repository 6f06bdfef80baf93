//! Decides which API family serves the account's home.

use serde_json::Value;
use strum::Display;

use crate::error::{Result, TadoError};
use crate::http::{ApiChannel, ApiRequest};
use crate::models::{decode, Home};

/// Hardware generation of a home.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Family {
    /// `PRE_LINE_X`, served by `my.tado.com`.
    PreLineX,
    /// `LINE_X`, served by `hops.tado.com`.
    LineX,
}

/// Outcome of probing: the home and its family.
#[derive(Debug, Clone, PartialEq)]
pub struct HomeProfile {
    pub home_id: u64,
    pub family: Family,
    pub home: Home,
}

/// Probes `me` and `homes/{id}` once over an authorized channel.
pub struct CapabilityResolver<'a> {
    channel: &'a ApiChannel,
}

impl<'a> CapabilityResolver<'a> {
    pub fn new(channel: &'a ApiChannel) -> Self {
        Self { channel }
    }

    /// Resolve the first home of the account and bind the channel to it.
    pub async fn resolve(&self) -> Result<HomeProfile> {
        let me = self.channel.request(&ApiRequest::me()).await?;
        let home_id = first_home_id(&me)?;
        self.channel.set_home_id(home_id)?;

        let home = self.channel.request(&ApiRequest::home("")).await?;
        let family = classify(&home)?;
        let home: Home = decode("home", home)?;
        tracing::info!(home_id, %family, "Resolved home generation");

        Ok(HomeProfile {
            home_id,
            family,
            home,
        })
    }
}

/// `homes[0].id` of a `me` response.
pub fn first_home_id(me: &Value) -> Result<u64> {
    if !me.is_object() {
        return Err(TadoError::UnknownHomeConfiguration(
            "account response is not an object".to_string(),
        ));
    }
    let homes = me
        .get("homes")
        .and_then(Value::as_array)
        .ok_or_else(|| TadoError::UnknownHomeConfiguration("account lists no homes".to_string()))?;
    let first = homes
        .first()
        .ok_or_else(|| TadoError::UnknownHomeConfiguration("account has no home".to_string()))?;
    first.get("id").and_then(Value::as_u64).ok_or_else(|| {
        TadoError::UnknownHomeConfiguration("first home has no numeric id".to_string())
    })
}

/// Map a home record to its family.
///
/// `LINE_X` is X; `PRE_LINE_X` or no generation at all is pre-X. Anything
/// else is refused rather than guessed.
pub fn classify(home: &Value) -> Result<Family> {
    let object = home.as_object().ok_or_else(|| {
        TadoError::UnknownHomeConfiguration("home response is not an object".to_string())
    })?;
    match object.get("generation") {
        None | Some(Value::Null) => Ok(Family::PreLineX),
        Some(Value::String(generation)) => match generation.as_str() {
            "LINE_X" => Ok(Family::LineX),
            "PRE_LINE_X" => Ok(Family::PreLineX),
            other => Err(TadoError::UnknownHomeConfiguration(format!(
                "unsupported generation '{other}'"
            ))),
        },
        Some(other) => Err(TadoError::UnknownHomeConfiguration(format!(
            "generation is not a string: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classifies_known_generations() {
        assert_eq!(classify(&json!({ "id": 1, "generation": "LINE_X" })).unwrap(), Family::LineX);
        assert_eq!(
            classify(&json!({ "id": 1, "generation": "PRE_LINE_X" })).unwrap(),
            Family::PreLineX
        );
        assert_eq!(classify(&json!({ "id": 1 })).unwrap(), Family::PreLineX);
    }

    #[test]
    fn rejects_unknown_generation_and_shapes() {
        for value in [
            json!({ "id": 1, "generation": "LINE_Y" }),
            json!({ "id": 1, "generation": 3 }),
            json!([]),
            json!("LINE_X"),
        ] {
            assert!(matches!(
                classify(&value),
                Err(TadoError::UnknownHomeConfiguration(_))
            ));
        }
    }

    #[test]
    fn first_home_id_requires_a_home() {
        assert_eq!(first_home_id(&json!({ "homes": [{ "id": 7, "name": "A" }] })).unwrap(), 7);
        assert!(first_home_id(&json!({ "homes": [] })).is_err());
        assert!(first_home_id(&json!({ "name": "no homes" })).is_err());
        assert!(first_home_id(&json!({ "homes": [{ "name": "no id" }] })).is_err());
    }
}
