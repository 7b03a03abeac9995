//! Parcel catalogue
//!
//! The field is a fixed catalogue: goal parcels on both sides, the two penalty
//! spots, the kickoff spot and a 60×50 grid of field parcels. Parcel IDs are
//! derived from position (`goal-left-0`, `penalty-right`, `kickoff`,
//! `field-12-34`) and never stored separately from that scheme.

use serde::{Deserialize, Serialize};

/// Field grid columns
pub const GRID_COLS: u16 = 60;
/// Field grid rows
pub const GRID_ROWS: u16 = 50;
/// Goal parcels per side
pub const GOAL_PARCELS_PER_SIDE: u16 = 5;

/// Total number of parcels in the catalogue
pub const TOTAL_PARCELS: usize =
    (GOAL_PARCELS_PER_SIDE as usize) * 2 + 2 + 1 + (GRID_ROWS as usize) * (GRID_COLS as usize);

/// Parcel type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(type_name = "parcel_type", rename_all = "lowercase"))]
pub enum ParcelType {
    Goal,
    Penalty,
    Kickoff,
    Field,
}

impl ParcelType {
    pub const ALL: [ParcelType; 4] = [Self::Goal, Self::Penalty, Self::Kickoff, Self::Field];

    /// Price in euro cents
    pub const fn price_cents(&self) -> i64 {
        match self {
            Self::Goal => 30_000,
            Self::Penalty => 30_000,
            Self::Kickoff => 50_000,
            Self::Field => 5_000,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Goal => "goal",
            Self::Penalty => "penalty",
            Self::Kickoff => "kickoff",
            Self::Field => "field",
        }
    }

    /// Name printed on buyer-facing documents
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Goal => "Tor-Parzelle",
            Self::Penalty => "Elfmeterpunkt",
            Self::Kickoff => "Anstoßpunkt",
            Self::Field => "Feld-Parzelle",
        }
    }
}

impl std::fmt::Display for ParcelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Goal side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalSide {
    Left,
    Right,
}

impl GoalSide {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }
}

/// A single sellable parcel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parcel {
    pub id: String,
    #[serde(rename = "type")]
    pub parcel_type: ParcelType,
    pub price_cents: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub col: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_side: Option<GoalSide>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_position: Option<u16>,
}

impl Parcel {
    fn plain(id: String, parcel_type: ParcelType) -> Self {
        Self {
            id,
            parcel_type,
            price_cents: parcel_type.price_cents(),
            row: None,
            col: None,
            goal_side: None,
            goal_position: None,
        }
    }

    pub fn goal(side: GoalSide, position: u16) -> Self {
        Self {
            goal_side: Some(side),
            goal_position: Some(position),
            ..Self::plain(format!("goal-{}-{position}", side.as_str()), ParcelType::Goal)
        }
    }

    pub fn penalty(side: GoalSide) -> Self {
        Self::plain(format!("penalty-{}", side.as_str()), ParcelType::Penalty)
    }

    pub fn kickoff() -> Self {
        Self::plain("kickoff".to_string(), ParcelType::Kickoff)
    }

    pub fn field(row: u16, col: u16) -> Self {
        Self {
            row: Some(row),
            col: Some(col),
            ..Self::plain(format!("field-{row}-{col}"), ParcelType::Field)
        }
    }
}

/// Availability of a parcel as shown on the field map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParcelStatus {
    Available,
    Reserved,
    Sold,
}

/// Parcel IDs currently held, split by reservation state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParcelAvailability {
    pub sold: Vec<String>,
    pub reserved: Vec<String>,
}

/// Per-type counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParcelCounts {
    pub goal: u32,
    pub penalty: u32,
    pub kickoff: u32,
    pub field: u32,
}

impl ParcelCounts {
    pub fn get(&self, parcel_type: ParcelType) -> u32 {
        match parcel_type {
            ParcelType::Goal => self.goal,
            ParcelType::Penalty => self.penalty,
            ParcelType::Kickoff => self.kickoff,
            ParcelType::Field => self.field,
        }
    }

    pub fn increment(&mut self, parcel_type: ParcelType) {
        match parcel_type {
            ParcelType::Goal => self.goal += 1,
            ParcelType::Penalty => self.penalty += 1,
            ParcelType::Kickoff => self.kickoff += 1,
            ParcelType::Field => self.field += 1,
        }
    }

    /// `self - sold - reserved` per type, floored at zero
    pub fn remaining(&self, sold: &ParcelCounts, reserved: &ParcelCounts) -> ParcelCounts {
        let mut out = ParcelCounts::default();
        for t in ParcelType::ALL {
            let left = self.get(t).saturating_sub(sold.get(t)).saturating_sub(reserved.get(t));
            match t {
                ParcelType::Goal => out.goal = left,
                ParcelType::Penalty => out.penalty = left,
                ParcelType::Kickoff => out.kickoff = left,
                ParcelType::Field => out.field = left,
            }
        }
        out
    }
}

/// Response body of the availability summary
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParcelSummary {
    pub available: ParcelCounts,
}

/// Every parcel, in catalogue order
pub fn generate_all_parcels() -> Vec<Parcel> {
    let mut parcels = Vec::with_capacity(TOTAL_PARCELS);

    for side in [GoalSide::Left, GoalSide::Right] {
        for position in 0..GOAL_PARCELS_PER_SIDE {
            parcels.push(Parcel::goal(side, position));
        }
    }

    parcels.push(Parcel::penalty(GoalSide::Left));
    parcels.push(Parcel::penalty(GoalSide::Right));
    parcels.push(Parcel::kickoff());

    for row in 0..GRID_ROWS {
        for col in 0..GRID_COLS {
            parcels.push(Parcel::field(row, col));
        }
    }

    parcels
}

/// Parse a parcel ID. Returns `None` for anything outside the catalogue.
pub fn parcel_by_id(id: &str) -> Option<Parcel> {
    if let Some(rest) = id.strip_prefix("goal-") {
        let (side, position) = rest.split_once('-')?;
        let side = GoalSide::parse(side)?;
        let position = parse_index(position, GOAL_PARCELS_PER_SIDE)?;
        return Some(Parcel::goal(side, position));
    }

    if let Some(side) = id.strip_prefix("penalty-") {
        return GoalSide::parse(side).map(Parcel::penalty);
    }

    if id == "kickoff" {
        return Some(Parcel::kickoff());
    }

    let rest = id.strip_prefix("field-")?;
    let (row, col) = rest.split_once('-')?;
    Some(Parcel::field(
        parse_index(row, GRID_ROWS)?,
        parse_index(col, GRID_COLS)?,
    ))
}

/// Canonical decimal index below `bound` ("7" yes, "07" and "+7" no)
fn parse_index(s: &str, bound: u16) -> Option<u16> {
    let value: u16 = s.parse().ok()?;
    (value < bound && value.to_string() == s).then_some(value)
}

/// Sum of catalogue prices in cents. Unknown IDs contribute nothing.
pub fn calculate_total_cents<S: AsRef<str>>(parcel_ids: &[S]) -> i64 {
    parcel_ids
        .iter()
        .filter_map(|id| parcel_by_id(id.as_ref()))
        .map(|p| p.price_cents)
        .sum()
}

/// Count parcels per type
pub fn count_by_type<'a>(parcels: impl IntoIterator<Item = &'a Parcel>) -> ParcelCounts {
    let mut counts = ParcelCounts::default();
    for parcel in parcels {
        counts.increment(parcel.parcel_type);
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalogue_size_and_order() {
        let parcels = generate_all_parcels();
        assert_eq!(parcels.len(), TOTAL_PARCELS);
        assert_eq!(parcels.len(), 3013);
        assert_eq!(parcels[0].id, "goal-left-0");
        assert_eq!(parcels[5].id, "goal-right-0");
        assert_eq!(parcels[10].id, "penalty-left");
        assert_eq!(parcels[11].id, "penalty-right");
        assert_eq!(parcels[12].id, "kickoff");
        assert_eq!(parcels[13].id, "field-0-0");
        assert_eq!(parcels.last().unwrap().id, "field-49-59");
    }

    #[test]
    fn test_catalogue_ids_are_unique_and_parse_back() {
        let parcels = generate_all_parcels();
        let ids: HashSet<&str> = parcels.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids.len(), parcels.len());
        for parcel in &parcels {
            assert_eq!(parcel_by_id(&parcel.id).as_ref(), Some(parcel));
        }
    }

    #[test]
    fn test_catalogue_counts() {
        let counts = count_by_type(&generate_all_parcels());
        assert_eq!(
            counts,
            ParcelCounts {
                goal: 10,
                penalty: 2,
                kickoff: 1,
                field: 3000,
            }
        );
    }

    #[test]
    fn test_parcel_by_id_fields() {
        let goal = parcel_by_id("goal-right-3").unwrap();
        assert_eq!(goal.parcel_type, ParcelType::Goal);
        assert_eq!(goal.goal_side, Some(GoalSide::Right));
        assert_eq!(goal.goal_position, Some(3));
        assert_eq!(goal.price_cents, 30_000);

        let field = parcel_by_id("field-12-34").unwrap();
        assert_eq!(field.row, Some(12));
        assert_eq!(field.col, Some(34));
        assert_eq!(field.price_cents, 5_000);

        assert_eq!(parcel_by_id("kickoff").unwrap().price_cents, 50_000);
        assert_eq!(
            parcel_by_id("penalty-left").unwrap().parcel_type,
            ParcelType::Penalty
        );
    }

    #[test]
    fn test_parcel_by_id_rejects_out_of_catalogue() {
        for id in [
            "",
            "goal-left-5",
            "goal-center-0",
            "goal-left",
            "penalty-middle",
            "kickoff-1",
            "field-50-0",
            "field-0-60",
            "field-01-2",
            "field-+1-2",
            "field-1",
            "field-1-2-3",
            "corner",
        ] {
            assert!(parcel_by_id(id).is_none(), "{id} should be rejected");
        }
    }

    #[test]
    fn test_calculate_total_cents() {
        let ids = ["goal-left-0", "goal-left-1", "kickoff", "field-0-0"];
        assert_eq!(calculate_total_cents(&ids), 30_000 + 30_000 + 50_000 + 5_000);
        assert_eq!(calculate_total_cents(&["nope", "field-0-0"]), 5_000);
        assert_eq!(calculate_total_cents::<&str>(&[]), 0);
    }

    #[test]
    fn test_remaining_floors_at_zero() {
        let total = ParcelCounts {
            goal: 10,
            penalty: 2,
            kickoff: 1,
            field: 3000,
        };
        let sold = ParcelCounts {
            goal: 2,
            kickoff: 1,
            ..Default::default()
        };
        let reserved = ParcelCounts {
            goal: 1,
            penalty: 5,
            field: 10,
            ..Default::default()
        };
        let left = total.remaining(&sold, &reserved);
        assert_eq!(left.goal, 7);
        assert_eq!(left.penalty, 0);
        assert_eq!(left.kickoff, 0);
        assert_eq!(left.field, 2990);
    }

    #[test]
    fn test_parcel_serialization() {
        let json = serde_json::to_value(parcel_by_id("field-1-2").unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "field-1-2",
                "type": "field",
                "price_cents": 5000,
                "row": 1,
                "col": 2,
            })
        );
    }
}
