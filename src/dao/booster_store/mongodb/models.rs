use mongodb::bson::{Document, doc};
use serde::{Deserialize, Serialize};

use crate::dao::models::{BoosterEntity, BoosterId, NewBoosterEntity, player_key};

/// Shape of a booster document inside the `boosters` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoBoosterDocument {
    /// Auto-incremented key allocated through the `counters` collection.
    #[serde(rename = "_id")]
    pub id: BoosterId,
    pub player: String,
    /// Lower-cased `player`, indexed for case-insensitive lookups.
    pub player_key: String,
    pub scope: String,
    pub multiplier: i32,
    pub duration_millis: i64,
    #[serde(default)]
    pub activated_at: Option<i64>,
}

impl MongoBoosterDocument {
    /// Document for a freshly granted booster.
    pub fn pending(id: BoosterId, booster: NewBoosterEntity) -> Self {
        Self {
            id,
            player_key: player_key(&booster.player),
            player: booster.player,
            scope: booster.scope,
            multiplier: booster.multiplier,
            duration_millis: booster.duration_millis,
            activated_at: None,
        }
    }
}

impl From<MongoBoosterDocument> for BoosterEntity {
    fn from(value: MongoBoosterDocument) -> Self {
        Self {
            id: value.id,
            player: value.player,
            scope: value.scope,
            multiplier: value.multiplier,
            duration_millis: value.duration_millis,
            activated_at: value.activated_at,
        }
    }
}

/// Id counter document living in the `counters` collection.
#[derive(Debug, Deserialize)]
pub struct CounterDocument {
    pub seq: i64,
}

pub fn doc_id(id: BoosterId) -> Document {
    doc! {"_id": id}
}

/// `now < activated_at + duration_millis`, evaluated by the server.
fn live_expr(now: i64) -> Document {
    doc! { "$lt": [now, { "$add": ["$activated_at", "$duration_millis"] }] }
}

/// Matches rows whose activation window still covers `now`.
pub fn live_filter(now: i64) -> Document {
    doc! {
        "activated_at": { "$ne": null },
        "$expr": live_expr(now),
    }
}

/// Matches a player's pending rows plus rows that are still live at `now`.
pub fn non_expired_filter(player: &str, now: i64) -> Document {
    doc! {
        "player_key": player_key(player),
        "$or": [
            { "activated_at": null },
            { "$expr": live_expr(now) },
        ],
    }
}

#[cfg(test)]
mod tests {
    use mongodb::bson::Bson;

    use super::*;

    #[test]
    fn live_filter_compares_now_strictly_against_window_end() {
        let filter = live_filter(5_000);

        let activated_at = filter.get_document("activated_at").unwrap();
        assert!(activated_at.get_null("$ne").is_ok());

        let comparison = filter
            .get_document("$expr")
            .unwrap()
            .get_array("$lt")
            .unwrap();
        assert_eq!(comparison[0], Bson::Int64(5_000));
        assert_eq!(
            comparison[1],
            Bson::Document(doc! { "$add": ["$activated_at", "$duration_millis"] })
        );
    }

    #[test]
    fn non_expired_filter_keeps_pending_rows_and_live_ones() {
        let filter = non_expired_filter("PlayerX", 5_000);
        assert_eq!(filter.get_str("player_key").unwrap(), "playerx");

        let branches = filter.get_array("$or").unwrap();
        assert_eq!(branches.len(), 2);
        assert_eq!(branches[0], Bson::Document(doc! { "activated_at": null }));

        let live_branch = branches[1].as_document().unwrap();
        let live = live_filter(5_000);
        assert_eq!(
            live_branch.get_document("$expr").unwrap(),
            live.get_document("$expr").unwrap()
        );
    }

    #[test]
    fn documents_round_trip_into_entities() {
        let new = NewBoosterEntity {
            player: "Alice".into(),
            scope: "sky_wars".into(),
            multiplier: 3,
            duration_millis: 60_000,
        };
        let document = MongoBoosterDocument::pending(7, new.clone());
        assert_eq!(document.player_key, "alice");
        assert_eq!(BoosterEntity::from(document), new.into_entity(7));
    }
}
