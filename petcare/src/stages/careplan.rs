//! Care-plan generation: home actions, contraindications and monitoring.

use super::{finish, require, TriageStage};
use crate::context::AnalysisContext;
use crate::core::{PipelineStage, StageOutput};
use crate::domain::{BodySystem, CarePlanData, MedicalData, SymptomData, TriageData, UrgencyLevel};
use async_trait::async_trait;

struct SystemAdvice {
    action: &'static str,
    avoid: &'static [&'static str],
    monitor: &'static [&'static str],
}

fn level_actions(level: UrgencyLevel) -> &'static [&'static str] {
    match level {
        UrgencyLevel::Red => &[
            "Go to the nearest emergency veterinary clinic now",
            "Call ahead so the clinic can prepare",
            "Keep your pet calm, warm and still during transport",
        ],
        UrgencyLevel::Orange => &[
            "Arrange a veterinary visit today",
            "Keep your pet quiet and confined",
            "Write down when the symptoms started and how they have changed",
        ],
        UrgencyLevel::Yellow => &[
            "Book a veterinary appointment within 24-48 hours",
            "Offer fresh water and let your pet rest",
        ],
        UrgencyLevel::Green => &[
            "Monitor at home and let your pet rest",
            "Keep fresh water available",
        ],
    }
}

fn system_advice(system: BodySystem) -> SystemAdvice {
    match system {
        BodySystem::Gastrointestinal => SystemAdvice {
            action: "Withhold food for a few hours, then offer small bland meals",
            avoid: &[
                "Do not force-feed",
                "Do not give anti-diarrhoeal medicine without veterinary advice",
            ],
            monitor: &[
                "Count vomiting and diarrhoea episodes",
                "Check water intake and gum colour",
            ],
        },
        BodySystem::Respiratory => SystemAdvice {
            action: "Keep the air around your pet clean and free of smoke",
            avoid: &["Do not exercise your pet", "Avoid collars that press on the throat"],
            monitor: &["Count breaths per minute while resting", "Watch for blue or pale gums"],
        },
        BodySystem::Urinary => SystemAdvice {
            action: "Encourage drinking with fresh water",
            avoid: &["Do not restrict water"],
            monitor: &["Note every attempt to urinate and whether urine is passed"],
        },
        BodySystem::Dermatological => SystemAdvice {
            action: "Keep the affected area clean and dry",
            avoid: &[
                "Do not apply human creams or essential oils",
                "Prevent licking or scratching of the area",
            ],
            monitor: &["Check the area daily for spread, discharge or smell"],
        },
        BodySystem::Musculoskeletal => SystemAdvice {
            action: "Restrict movement: no stairs, jumping or running",
            avoid: &["Do not give human painkillers"],
            monitor: &["Watch whether your pet starts bearing weight again"],
        },
        BodySystem::Neurological => SystemAdvice {
            action: "Move objects away so your pet cannot hurt itself",
            avoid: &["Do not put your hand in your pet's mouth during a seizure"],
            monitor: &["Time any seizure and how long recovery takes"],
        },
        BodySystem::Ocular => SystemAdvice {
            action: "Gently wipe away discharge with a damp cloth",
            avoid: &["Do not use human eye drops"],
            monitor: &["Watch for squinting, cloudiness or rubbing at the eye"],
        },
        BodySystem::Otic => SystemAdvice {
            action: "Stop your pet scratching at the ear",
            avoid: &["Do not push cotton buds into the ear canal"],
            monitor: &["Watch for head tilt or loss of balance"],
        },
        BodySystem::Dental => SystemAdvice {
            action: "Offer soft food",
            avoid: &["Do not give hard chews or bones"],
            monitor: &["Check whether your pet is eating"],
        },
        BodySystem::Cardiovascular => SystemAdvice {
            action: "Keep your pet calm and at rest",
            avoid: &["Do not exercise your pet"],
            monitor: &["Check gum colour and breathing rate"],
        },
        BodySystem::General => SystemAdvice {
            action: "Let your pet rest somewhere quiet and comfortable",
            avoid: &[],
            monitor: &["Check appetite, energy and toilet habits twice a day"],
        },
    }
}

const ALWAYS_AVOID: &str = "Do not give human medication unless a vet tells you to";
const ESCALATION_SIGNS: &str =
    "Seek emergency care if breathing changes, gums turn pale or your pet collapses";
const SMALL_PET_WARNING: &str = "Small pets can deteriorate within hours when they stop eating";

fn push_unique(list: &mut Vec<String>, item: &str) {
    if !list.iter().any(|existing| existing == item) {
        list.push(item.to_string());
    }
}

/// Builds the care plan. Home treatment is only suggested below orange;
/// at orange and above the plan is about getting to a vet safely.
#[must_use]
pub fn build_care_plan(
    triage: &TriageData,
    medical: &MedicalData,
    symptoms: Option<&SymptomData>,
) -> CarePlanData {
    let advice = system_advice(medical.primary.system);
    let mut plan = CarePlanData {
        vet_visit_window: triage.vet_visit_window.clone(),
        care_guide: format!(
            "{} is graded {} ({} risk): {}.",
            medical.primary.name, triage.level, triage.risk, triage.vet_visit_window
        ),
        ..CarePlanData::default()
    };

    for action in level_actions(triage.level) {
        push_unique(&mut plan.immediate_home_actions, action);
    }
    if triage.level <= UrgencyLevel::Yellow {
        push_unique(&mut plan.immediate_home_actions, advice.action);
    }

    for item in advice.avoid {
        push_unique(&mut plan.things_to_avoid, item);
    }
    push_unique(&mut plan.things_to_avoid, ALWAYS_AVOID);

    for item in advice.monitor {
        push_unique(&mut plan.monitoring_guide, item);
    }
    if let Some(symptoms) = symptoms {
        let small_pet_not_eating = symptoms.species.is_some_and(|s| s.is_small_exotic())
            && symptoms.has_symptom("loss of appetite");
        if small_pet_not_eating {
            push_unique(&mut plan.monitoring_guide, SMALL_PET_WARNING);
        }
    }
    if triage.level < UrgencyLevel::Red {
        push_unique(&mut plan.monitoring_guide, ESCALATION_SIGNS);
    }

    plan
}

/// Turns the urgency grade and primary condition into owner guidance.
#[derive(Debug, Clone, Copy, Default)]
pub struct CarePlanStage;

impl CarePlanStage {
    /// Creates the stage.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TriageStage for CarePlanStage {
    fn stage(&self) -> PipelineStage {
        PipelineStage::CarePlanGeneration
    }

    async fn run(&self, ctx: &AnalysisContext, _original_input: &str) -> StageOutput {
        let result = require(ctx.triage_data(), "triage_data").and_then(|triage| {
            let medical = require(ctx.medical_data(), "medical_data")?;
            Ok(build_care_plan(triage, medical, ctx.symptom_data()))
        });
        finish(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConditionCandidate, ConditionSeverity, Species};
    use crate::testing::fixtures;

    fn triage(level: UrgencyLevel) -> TriageData {
        TriageData {
            level,
            risk: level.risk(),
            score: 0.0,
            vet_visit_window: level.vet_visit_window().to_string(),
            rationale: Vec::new(),
        }
    }

    #[test]
    fn test_yellow_gastro_plan() {
        let plan = build_care_plan(&fixtures::triage_data(), &fixtures::medical_data(), None);

        assert_eq!(
            plan.immediate_home_actions[0],
            "Book a veterinary appointment within 24-48 hours"
        );
        assert!(plan
            .immediate_home_actions
            .iter()
            .any(|a| a.contains("bland meals")));
        assert!(plan.things_to_avoid.iter().any(|a| a == "Do not force-feed"));
        assert!(plan.monitoring_guide.iter().any(|m| m.contains("vomiting")));
        assert_eq!(
            plan.care_guide,
            "Acute gastroenteritis is graded yellow (moderate risk): see a vet within 24-48 hours."
        );
    }

    #[test]
    fn test_red_plan_has_no_home_treatment() {
        let plan = build_care_plan(&triage(UrgencyLevel::Red), &fixtures::medical_data(), None);

        assert!(plan.immediate_home_actions[0].contains("emergency"));
        assert!(!plan
            .immediate_home_actions
            .iter()
            .any(|a| a.contains("bland meals")));
        assert!(!plan.monitoring_guide.iter().any(|m| m == ESCALATION_SIGNS));
        assert_eq!(plan.vet_visit_window, "go to an emergency clinic immediately");
    }

    #[test]
    fn test_always_avoid_human_medication() {
        for level in [UrgencyLevel::Green, UrgencyLevel::Orange] {
            let plan = build_care_plan(&triage(level), &fixtures::medical_data(), None);
            assert!(plan.things_to_avoid.iter().any(|a| a == ALWAYS_AVOID));
        }
    }

    #[test]
    fn test_small_pet_not_eating_warning() {
        let medical = MedicalData::from_ranked(vec![ConditionCandidate::new(
            "Gastrointestinal stasis",
            BodySystem::Gastrointestinal,
            ConditionSeverity::Serious,
            0.6,
        )])
        .unwrap();
        let symptoms = SymptomData {
            species: Some(Species::Rabbit),
            symptoms: vec!["loss of appetite".to_string()],
            ..Default::default()
        };

        let plan = build_care_plan(&triage(UrgencyLevel::Orange), &medical, Some(&symptoms));
        assert!(plan.monitoring_guide.iter().any(|m| m == SMALL_PET_WARNING));
    }

    #[tokio::test]
    async fn test_stage_requires_triage_data() {
        let ctx = fixtures::context_at(PipelineStage::TriageScoring, false);
        let output = CarePlanStage::new().run(&ctx, "").await;
        assert_eq!(output.failure_reason(), Some("triage_data is not available"));
    }
}
