//! Structured symptom extraction results.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Animal species recognised by intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Species {
    /// Dogs and puppies.
    Dog,
    /// Cats and kittens.
    Cat,
    /// Rabbits.
    Rabbit,
    /// Hamsters.
    Hamster,
    /// Guinea pigs.
    GuineaPig,
    /// Ferrets.
    Ferret,
    /// Pet birds.
    Bird,
    /// Hedgehogs.
    Hedgehog,
    /// Lizards, snakes, turtles and tortoises.
    Reptile,
}

impl Species {
    /// Small and exotic species that tend to mask illness until late.
    #[must_use]
    pub fn is_small_exotic(self) -> bool {
        !matches!(self, Self::Dog | Self::Cat)
    }

    /// Returns the display name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dog => "dog",
            Self::Cat => "cat",
            Self::Rabbit => "rabbit",
            Self::Hamster => "hamster",
            Self::GuineaPig => "guinea pig",
            Self::Ferret => "ferret",
            Self::Bird => "bird",
            Self::Hedgehog => "hedgehog",
            Self::Reptile => "reptile",
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Organ system a symptom or condition belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodySystem {
    /// Stomach and intestines.
    Gastrointestinal,
    /// Airways and lungs.
    Respiratory,
    /// Brain and nerves.
    Neurological,
    /// Kidneys and bladder.
    Urinary,
    /// Skin and coat.
    Dermatological,
    /// Bones, joints and muscles.
    Musculoskeletal,
    /// Eyes.
    Ocular,
    /// Ears.
    Otic,
    /// Teeth and mouth.
    Dental,
    /// Heart and circulation.
    Cardiovascular,
    /// Whole-body signs.
    General,
}

impl BodySystem {
    /// Returns the snake_case name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gastrointestinal => "gastrointestinal",
            Self::Respiratory => "respiratory",
            Self::Neurological => "neurological",
            Self::Urinary => "urinary",
            Self::Dermatological => "dermatological",
            Self::Musculoskeletal => "musculoskeletal",
            Self::Ocular => "ocular",
            Self::Otic => "otic",
            Self::Dental => "dental",
            Self::Cardiovascular => "cardiovascular",
            Self::General => "general",
        }
    }
}

impl fmt::Display for BodySystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A phrase in the description that raises urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityCue {
    /// Active bleeding.
    Bleeding,
    /// Collapse or unresponsiveness.
    Collapse,
    /// Laboured or open-mouth breathing.
    BreathingDifficulty,
    /// Seizure or convulsions.
    Seizure,
    /// Known or suspected poison ingestion.
    ToxinExposure,
    /// Fall, bite, road accident.
    Trauma,
    /// Unable to pass urine.
    UrinaryBlockage,
    /// Swollen or bloated abdomen.
    AbdominalDistension,
    /// Pale, white or blue gums.
    PaleGums,
    /// Vomiting many times.
    RepeatedVomiting,
    /// Refusing food.
    NotEating,
    /// Low energy.
    Lethargy,
}

impl SeverityCue {
    /// Score contribution of this cue.
    #[must_use]
    pub fn weight(self) -> f64 {
        match self {
            Self::Collapse | Self::BreathingDifficulty | Self::UrinaryBlockage => 1.5,
            Self::Seizure | Self::ToxinExposure | Self::PaleGums => 1.2,
            Self::AbdominalDistension => 1.0,
            Self::Bleeding | Self::Trauma => 0.8,
            Self::RepeatedVomiting => 0.6,
            Self::NotEating | Self::Lethargy => 0.3,
        }
    }

    /// Cues that on their own warrant same-day care.
    #[must_use]
    pub fn is_emergency(self) -> bool {
        matches!(
            self,
            Self::Collapse
                | Self::BreathingDifficulty
                | Self::Seizure
                | Self::ToxinExposure
                | Self::UrinaryBlockage
                | Self::AbdominalDistension
                | Self::PaleGums
        )
    }
}

/// How long the symptoms have been present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomDuration {
    /// Duration in hours.
    pub hours: u32,
    /// The phrase it was read from.
    pub text: String,
}

impl SymptomDuration {
    /// Creates a new duration.
    #[must_use]
    pub fn new(hours: u32, text: impl Into<String>) -> Self {
        Self {
            hours,
            text: text.into(),
        }
    }

    /// Returns the duration in days.
    #[must_use]
    pub fn days(&self) -> f64 {
        f64::from(self.hours) / 24.0
    }
}

/// Structured attributes extracted from the free-text description.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SymptomData {
    /// The species, if mentioned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub species: Option<Species>,
    /// Canonical symptom names in order of first appearance in the lexicon.
    pub symptoms: Vec<String>,
    /// Body systems touched by the symptoms.
    pub affected_systems: BTreeSet<BodySystem>,
    /// Urgency-raising cues.
    #[serde(default)]
    pub severity_cues: BTreeSet<SeverityCue>,
    /// How long symptoms have lasted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<SymptomDuration>,
}

impl SymptomData {
    /// Returns true if the symptom was extracted.
    #[must_use]
    pub fn has_symptom(&self, name: &str) -> bool {
        self.symptoms.iter().any(|s| s == name)
    }

    /// Returns true if the cue was detected.
    #[must_use]
    pub fn has_cue(&self, cue: SeverityCue) -> bool {
        self.severity_cues.contains(&cue)
    }

    /// Returns the detected emergency cues.
    pub fn emergency_cues(&self) -> impl Iterator<Item = SeverityCue> + '_ {
        self.severity_cues.iter().copied().filter(|c| c.is_emergency())
    }

    /// Returns the duration in hours, if known.
    #[must_use]
    pub fn duration_hours(&self) -> Option<u32> {
        self.duration.as_ref().map(|d| d.hours)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_species_exotic() {
        assert!(!Species::Dog.is_small_exotic());
        assert!(!Species::Cat.is_small_exotic());
        assert!(Species::Rabbit.is_small_exotic());
        assert!(Species::Bird.is_small_exotic());
    }

    #[test]
    fn test_species_serialize() {
        let json = serde_json::to_string(&Species::GuineaPig).unwrap();
        assert_eq!(json, r#""guinea_pig""#);
        assert_eq!(Species::GuineaPig.to_string(), "guinea pig");
    }

    #[test]
    fn test_emergency_cues() {
        let data = SymptomData {
            severity_cues: [SeverityCue::Lethargy, SeverityCue::Seizure, SeverityCue::Collapse]
                .into_iter()
                .collect(),
            ..Default::default()
        };

        let emergencies: Vec<_> = data.emergency_cues().collect();
        assert_eq!(emergencies, vec![SeverityCue::Collapse, SeverityCue::Seizure]);
        assert!(data.has_cue(SeverityCue::Lethargy));
    }

    #[test]
    fn test_duration_days() {
        let duration = SymptomDuration::new(48, "2 days");
        assert!((duration.days() - 2.0).abs() < f64::EPSILON);
    }
}
