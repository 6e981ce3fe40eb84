//! Domain types: persons, gender codes, and the closed relationship vocabulary.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::KinmatchError;

/// Gender code as stored and exchanged ("M" / "F").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Gender {
    pub fn as_code(&self) -> &'static str {
        match self {
            Gender::Male => "M",
            Gender::Female => "F",
        }
    }
}

impl FromStr for Gender {
    type Err = KinmatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "M" => Ok(Gender::Male),
            "F" => Ok(Gender::Female),
            other => Err(KinmatchError::InvalidInput(format!(
                "Unrecognized gender code: {} (expected M or F)",
                other
            ))),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_code())
    }
}

/// A person record as stored in the persons table.
///
/// `death_year = None` means living. `sub_category_id` is the lineage/clan
/// (gotra) marker used by the exclusion rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub person_id: String,
    pub first_name: String,
    pub last_name: String,
    pub gender: Gender,
    pub birth_year: Option<i32>,
    pub death_year: Option<i32>,
    pub religion_id: Option<String>,
    pub category_id: Option<String>,
    pub sub_category_id: Option<String>,
    pub address: Option<String>,
}

/// Closed vocabulary of relationship labels.
///
/// A stored edge (person, related_person, label) reads "related_person is
/// `label` to person". Keeping this a closed enum lets the marital/parental
/// exclusion and inverse-label logic be exhaustive matches instead of string
/// comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationshipLabel {
    Father,
    Mother,
    Brother,
    Sister,
    Son,
    Daughter,
    Husband,
    Wife,
    Spouse,
    Grandfather,
    Grandmother,
    Grandson,
    Granddaughter,
    Uncle,
    Aunt,
    Nephew,
    Niece,
    Cousin,
}

impl RelationshipLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipLabel::Father => "Father",
            RelationshipLabel::Mother => "Mother",
            RelationshipLabel::Brother => "Brother",
            RelationshipLabel::Sister => "Sister",
            RelationshipLabel::Son => "Son",
            RelationshipLabel::Daughter => "Daughter",
            RelationshipLabel::Husband => "Husband",
            RelationshipLabel::Wife => "Wife",
            RelationshipLabel::Spouse => "Spouse",
            RelationshipLabel::Grandfather => "Grandfather",
            RelationshipLabel::Grandmother => "Grandmother",
            RelationshipLabel::Grandson => "Grandson",
            RelationshipLabel::Granddaughter => "Granddaughter",
            RelationshipLabel::Uncle => "Uncle",
            RelationshipLabel::Aunt => "Aunt",
            RelationshipLabel::Nephew => "Nephew",
            RelationshipLabel::Niece => "Niece",
            RelationshipLabel::Cousin => "Cousin",
        }
    }

    /// True for labels that make a person ineligible: an existing spouse
    /// edge, or a Son/Daughter edge indicating recorded children.
    pub fn is_spousal_or_child(&self) -> bool {
        matches!(
            self,
            RelationshipLabel::Husband
                | RelationshipLabel::Wife
                | RelationshipLabel::Spouse
                | RelationshipLabel::Son
                | RelationshipLabel::Daughter
        )
    }

    /// Label for the reverse direction of an edge.
    ///
    /// If B is `self` to A, then A is `self.inverse(a_gender)` to B. The
    /// caller passes A's gender since many inverses are gendered (B is A's
    /// Father => A is B's Son or Daughter).
    pub fn inverse(&self, other_gender: Gender) -> RelationshipLabel {
        use RelationshipLabel::*;
        match (self, other_gender) {
            (Father | Mother, Gender::Male) => Son,
            (Father | Mother, Gender::Female) => Daughter,
            (Son | Daughter, Gender::Male) => Father,
            (Son | Daughter, Gender::Female) => Mother,
            (Brother | Sister, Gender::Male) => Brother,
            (Brother | Sister, Gender::Female) => Sister,
            (Husband | Wife, Gender::Male) => Husband,
            (Husband | Wife, Gender::Female) => Wife,
            (Spouse, _) => Spouse,
            (Grandfather | Grandmother, Gender::Male) => Grandson,
            (Grandfather | Grandmother, Gender::Female) => Granddaughter,
            (Grandson | Granddaughter, Gender::Male) => Grandfather,
            (Grandson | Granddaughter, Gender::Female) => Grandmother,
            (Uncle | Aunt, Gender::Male) => Nephew,
            (Uncle | Aunt, Gender::Female) => Niece,
            (Nephew | Niece, Gender::Male) => Uncle,
            (Nephew | Niece, Gender::Female) => Aunt,
            (Cousin, _) => Cousin,
        }
    }

    /// All labels, for stats reporting and validation messages.
    pub fn all() -> &'static [RelationshipLabel] {
        use RelationshipLabel::*;
        &[
            Father,
            Mother,
            Brother,
            Sister,
            Son,
            Daughter,
            Husband,
            Wife,
            Spouse,
            Grandfather,
            Grandmother,
            Grandson,
            Granddaughter,
            Uncle,
            Aunt,
            Nephew,
            Niece,
            Cousin,
        ]
    }
}

impl FromStr for RelationshipLabel {
    type Err = KinmatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RelationshipLabel::all()
            .iter()
            .find(|l| l.as_str().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| {
                KinmatchError::InvalidInput(format!("Unrecognized relationship label: {}", s))
            })
    }
}

impl fmt::Display for RelationshipLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
