//! Symptom intake: free text to structured symptom attributes.

use super::{finish, TriageStage};
use crate::config::IntakeConfig;
use crate::context::AnalysisContext;
use crate::core::{PipelineStage, StageOutput};
use crate::domain::{BodySystem, SeverityCue, Species, SymptomData, SymptomDuration};
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

fn compile<T: Copy>(table: &[(&str, T)]) -> Vec<(Regex, T)> {
    table
        .iter()
        .filter_map(|(pattern, value)| match Regex::new(pattern) {
            Ok(re) => Some((re, *value)),
            Err(err) => {
                tracing::error!(pattern = %pattern, error = %err, "Invalid intake pattern");
                None
            }
        })
        .collect()
}

static SPECIES: LazyLock<Vec<(Regex, Species)>> = LazyLock::new(|| {
    compile(&[
        (r"\b(?:dogs?|pupp(?:y|ies)|pups?|canine)\b", Species::Dog),
        (r"\b(?:cats?|kittens?|kitty|feline)\b", Species::Cat),
        (r"\b(?:rabbits?|bunn(?:y|ies))\b", Species::Rabbit),
        (r"\bhamsters?\b", Species::Hamster),
        (r"\bguinea ?pigs?\b", Species::GuineaPig),
        (r"\bferrets?\b", Species::Ferret),
        (r"\b(?:birds?|parrots?|budgies?|parakeets?|cockatiels?|canar(?:y|ies)|finch(?:es)?)\b", Species::Bird),
        (r"\bhedgehogs?\b", Species::Hedgehog),
        (r"\b(?:reptiles?|lizards?|geckos?|snakes?|turtles?|tortoises?|iguanas?|bearded dragons?)\b", Species::Reptile),
    ])
});

static SPECIES_TAG: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\[species:\s*([a-z ]+?)\s*\]").ok());

/// (pattern, canonical symptom, body system)
static SYMPTOMS: LazyLock<Vec<(Regex, (&'static str, BodySystem))>> = LazyLock::new(|| {
    use BodySystem::{
        Cardiovascular, Dental, Dermatological, Gastrointestinal, General, Musculoskeletal,
        Neurological, Ocular, Otic, Respiratory, Urinary,
    };
    compile(&[
        (r"\bvomit\w*|\bthrow(?:s|ing)? up|\bthrew up|\bpuk(?:e|ed|es|ing)\b", ("vomiting", Gastrointestinal)),
        (r"diarrh?o?ea|\bloose (?:stools?|poop)|\brunny (?:stools?|poop)", ("diarrhea", Gastrointestinal)),
        (r"not eating|won'?t eat|stopped eating|refus\w* (?:to eat|food)|off (?:his|her|its|their) food|loss of appetite|no appetite|anorexi\w*", ("loss of appetite", Gastrointestinal)),
        (r"\bretch\w*|dry heav\w*|\bgagging", ("retching", Gastrointestinal)),
        (r"\bbloat\w*|swollen (?:belly|abdomen|stomach|tummy)|distended (?:belly|abdomen|stomach)", ("bloated abdomen", Gastrointestinal)),
        (r"no (?:poop|droppings|stools?)|fewer droppings|small droppings|not pooping|constipat\w*", ("reduced droppings", Gastrointestinal)),
        (r"\b(?:ate|eaten|swallowed|chewed|licked|got into)\b.*\b(?:chocolate|grapes?|raisins?|xylitol|lil(?:y|ies)|rat poison|rat bait|antifreeze|onions?|garlic|ibuprofen|paracetamol|pills?|medication|bleach)|\bpoison\w*|\btoxic\b", ("suspected poisoning", Gastrointestinal)),
        (r"letharg\w*|listless|no energy|sluggish|very tired|weak(?:ness)?\b", ("lethargy", General)),
        (r"\bdrool\w*|salivat\w*", ("drooling", General)),
        (r"heat ?stroke|overheat\w*|hot car|too hot", ("overheating", General)),
        (r"\bswell\w*|\bswollen|\blumps?\b", ("swelling", General)),
        (r"\bbleed\w*|bloody (?:nose|paw|wound)|lots of blood", ("bleeding", General)),
        (r"collaps\w*|passed out|faint\w*|unconscious|(?:can'?t|cannot|unable to) stand", ("collapse", Neurological)),
        (r"seiz\w*|convuls\w*|\bfitting\b", ("seizure", Neurological)),
        (r"trembl\w*|shiver\w*|twitch\w*|tremors?\b", ("trembling", Neurological)),
        (r"\bcough\w*", ("coughing", Respiratory)),
        (r"\bsneez\w*", ("sneezing", Respiratory)),
        (r"(?:runny|snotty) nose|nasal discharge", ("nasal discharge", Respiratory)),
        (r"(?:trouble|difficulty|struggling|hard) (?:breathing|to breathe)|(?:can'?t|cannot) breathe|gasping|labou?red breathing|wheez\w*|open[- ]mouth breathing", ("breathing difficulty", Respiratory)),
        (r"\bpant(?:s|ing)?\b", ("panting", Respiratory)),
        (r"strain\w* to (?:pee|urinate)|(?:can'?t|cannot|unable to) (?:pee|urinate)|not (?:peeing|urinating)|no urine", ("straining to urinate", Urinary)),
        (r"(?:peeing|urinating) (?:a lot|more|frequently)|frequent urination", ("frequent urination", Urinary)),
        (r"blood in (?:the |his |her |its )?(?:urine|pee)|bloody (?:urine|pee)", ("blood in urine", Urinary)),
        (r"drinking (?:a lot|more|excessively)|excessive thirst|very thirsty", ("excessive thirst", Urinary)),
        (r"\bitch\w*|scratch(?:es|ing)? (?:a lot|constantly|all the time|(?:him|her|it)self)|\bscratching\b", ("itching", Dermatological)),
        (r"hair loss|losing (?:hair|fur)|bald (?:patch|spot)(?:es|s)?|fur loss", ("hair loss", Dermatological)),
        (r"red (?:skin|rash)|\brash\b|hot ?spots?", ("skin redness", Dermatological)),
        (r"\bwounds?\b|\bcuts?\b|\bgash\w*|lacerat\w*|bite wound", ("wound", Dermatological)),
        (r"head shak\w*|shak(?:es|ing) (?:his|her|its) head|ear (?:discharge|smell|infection)|smelly ears?|scratch\w* (?:at )?(?:his |her |its )?ears?", ("ear discomfort", Otic)),
        (r"eye discharge|(?:goopy|watery|red|cloudy|swollen) eyes?|squint\w*", ("eye discharge", Ocular)),
        (r"\blimp\w*|\blame(?:ness)?\b|not (?:putting|bearing) weight|favou?ring (?:a|his|her|its) (?:leg|paw)", ("limping", Musculoskeletal)),
        (r"hit by (?:a )?car|\bfell (?:off|from|down|out of)\b|had a fall|fall(?:en)? (?:from|off)|\binjur\w*|\battacked\b|bitten by|kicked|stepped on", ("injury", Musculoskeletal)),
        (r"bad breath|smelly breath|halitosis", ("bad breath", Dental)),
        (r"broken tooth|tooth ?ache|sore (?:teeth|mouth|gums)|pawing at (?:the |his |her |its )?mouth|dropping food", ("dental pain", Dental)),
        (r"(?:pale|white|grey|gray|blue) gums", ("pale gums", Cardiovascular)),
    ])
});

static CUES: LazyLock<Vec<(Regex, SeverityCue)>> = LazyLock::new(|| {
    compile(&[
        (r"\bbleed\w*|lots of blood|bloody (?:nose|paw|wound)", SeverityCue::Bleeding),
        (r"collaps\w*|passed out|faint\w*|unconscious|(?:can'?t|cannot|unable to) stand", SeverityCue::Collapse),
        (r"(?:trouble|difficulty|struggling|hard) (?:breathing|to breathe)|(?:can'?t|cannot) breathe|gasping|labou?red breathing|open[- ]mouth breathing|blue (?:gums|tongue)", SeverityCue::BreathingDifficulty),
        (r"seiz\w*|convuls\w*|\bfitting\b", SeverityCue::Seizure),
        (r"\b(?:ate|eaten|swallowed|chewed|licked|got into)\b.*\b(?:chocolate|grapes?|raisins?|xylitol|lil(?:y|ies)|rat poison|rat bait|antifreeze|onions?|garlic|ibuprofen|paracetamol|pills?|medication|bleach)|\bpoison\w*|\btoxic\b", SeverityCue::ToxinExposure),
        (r"hit by (?:a )?car|\bfell (?:off|from|down|out of)\b|had a fall|fall(?:en)? (?:from|off)|\battacked\b|bitten by|kicked|stepped on", SeverityCue::Trauma),
        (r"strain\w* to (?:pee|urinate)|(?:can'?t|cannot|unable to) (?:pee|urinate)|not (?:peeing|urinating)|no urine", SeverityCue::UrinaryBlockage),
        (r"\bbloat\w*|swollen (?:belly|abdomen|stomach|tummy)|distended (?:belly|abdomen|stomach)", SeverityCue::AbdominalDistension),
        (r"(?:pale|white|grey|gray|blue) gums", SeverityCue::PaleGums),
        (r"not eating|won'?t eat|stopped eating|refus\w* (?:to eat|food)|off (?:his|her|its|their) food|loss of appetite|no appetite", SeverityCue::NotEating),
        (r"letharg\w*|listless|no energy|sluggish|very tired", SeverityCue::Lethargy),
    ])
});

/// Repetition wording attached to a vomiting phrase, on either side.
static REPEATED: LazyLock<Option<Regex>> = LazyLock::new(|| {
    let vomit = r"(?:vomit\w*|throw(?:s|ing)? up|threw up|puk(?:e|ed|es|ing))";
    let before = r"(?:repeatedly|keeps?|kept|constantly|non-?stop)";
    let after = r"(?:repeatedly|constantly|non-?stop|again and again|all (?:day|night)|(?:several|multiple|many|[3-9]|\d{2,}) times)";
    Regex::new(&format!(
        r"\b{before}\s+(?:\w+\s+){{0,1}}?{vomit}|\b{vomit}\s+(?:\w+\s+){{0,2}}?{after}"
    ))
    .ok()
});

/// Words that deny the finding that follows them in the same clause.
const NEGATORS: &[&str] = &[
    "no", "not", "never", "without", "none", "nor", "isn't", "isnt", "hasn't", "hasnt",
    "doesn't", "doesnt", "didn't", "didnt", "wasn't", "wasnt", "hadn't", "hadnt", "aren't",
];

/// How many words before a match are checked for a negator.
const NEGATION_WINDOW: usize = 4;

/// True if a negator appears shortly before `start`, within the same clause.
fn is_negated(text: &str, start: usize) -> bool {
    let before = &text[..start];
    let clause = before
        .rsplit(|c: char| matches!(c, ',' | '.' | ';' | ':' | '!' | '?'))
        .next()
        .unwrap_or(before);
    let clause = clause.rsplit(" but ").next().unwrap_or(clause);
    clause
        .split_whitespace()
        .rev()
        .take(NEGATION_WINDOW)
        .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric() && c != '\''))
        .any(|word| NEGATORS.contains(&word))
}

/// True if `re` matches somewhere the owner is not denying it.
fn affirmed(re: &Regex, text: &str) -> bool {
    re.find_iter(text).any(|m| !is_negated(text, m.start()))
}

static DURATION: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"\b(\d+|an?|one|two|three|four|five|six|seven|eight|nine|ten|a few|few|several|a couple of|couple of)\s+(hours?|hrs?|days?|weeks?|months?)\b",
    )
    .ok()
});

const RELATIVE_DURATIONS: &[(&str, u32)] = &[
    ("since yesterday", 24),
    ("last night", 12),
    ("overnight", 12),
    ("this morning", 6),
    ("today", 6),
];

fn quantity(word: &str) -> Option<u32> {
    match word {
        "a" | "an" | "one" => Some(1),
        "two" | "a couple of" | "couple of" => Some(2),
        "three" | "a few" | "few" | "several" => Some(3),
        "four" => Some(4),
        "five" => Some(5),
        "six" => Some(6),
        "seven" => Some(7),
        "eight" => Some(8),
        "nine" => Some(9),
        "ten" => Some(10),
        digits => digits.parse().ok(),
    }
}

fn unit_hours(unit: &str) -> u32 {
    match unit.chars().next() {
        Some('d') => 24,
        Some('w') => 24 * 7,
        Some('m') => 24 * 30,
        _ => 1,
    }
}

/// Extracts the species, preferring an explicit `[species: x]` tag and
/// otherwise taking the earliest mention.
fn extract_species(text: &str) -> Option<Species> {
    if let Some(tag) = SPECIES_TAG.as_ref().and_then(|re| re.captures(text)) {
        let name = tag.get(1).map_or("", |m| m.as_str());
        if let Some(species) = SPECIES
            .iter()
            .find(|(re, _)| re.is_match(name))
            .map(|(_, s)| *s)
        {
            return Some(species);
        }
    }

    SPECIES
        .iter()
        .filter_map(|(re, species)| re.find(text).map(|m| (m.start(), *species)))
        .min_by_key(|(pos, _)| *pos)
        .map(|(_, species)| species)
}

/// Longest duration mentioned, in hours.
fn extract_duration(text: &str) -> Option<SymptomDuration> {
    let mut best: Option<SymptomDuration> = None;
    let mut consider = |hours: u32, phrase: &str| {
        if best.as_ref().map_or(true, |b| hours > b.hours) {
            best = Some(SymptomDuration::new(hours, phrase.trim()));
        }
    };

    if let Some(re) = DURATION.as_ref() {
        for caps in re.captures_iter(text) {
            let (Some(count), Some(unit), Some(whole)) = (caps.get(1), caps.get(2), caps.get(0))
            else {
                continue;
            };
            if let Some(n) = quantity(count.as_str()) {
                consider(n.saturating_mul(unit_hours(unit.as_str())), whole.as_str());
            }
        }
    }
    for (phrase, hours) in RELATIVE_DURATIONS {
        if text.contains(phrase) {
            consider(*hours, *phrase);
        }
    }

    best
}

/// Runs the lexicon over `text`. Returns `None` when no symptom is found.
pub(crate) fn extract(text: &str) -> Option<SymptomData> {
    let text = text.to_lowercase();
    let mut data = SymptomData {
        species: extract_species(&text),
        duration: extract_duration(&text),
        ..SymptomData::default()
    };

    for (re, (name, system)) in SYMPTOMS.iter() {
        if !data.has_symptom(name) && affirmed(re, &text) {
            data.symptoms.push((*name).to_string());
            data.affected_systems.insert(*system);
        }
    }
    if data.symptoms.is_empty() {
        return None;
    }

    for (re, cue) in CUES.iter() {
        if affirmed(re, &text) {
            data.severity_cues.insert(*cue);
        }
    }
    if data.has_symptom("vomiting") && REPEATED.as_ref().is_some_and(|re| affirmed(re, &text)) {
        data.severity_cues.insert(SeverityCue::RepeatedVomiting);
    }

    Some(data)
}

/// Extracts species, symptoms, body systems, severity cues and duration
/// from the context's description.
#[derive(Debug, Clone, Default)]
pub struct SymptomIntakeStage {
    config: IntakeConfig,
}

impl SymptomIntakeStage {
    /// Creates the stage.
    #[must_use]
    pub fn new(config: IntakeConfig) -> Self {
        Self { config }
    }

    fn evaluate(&self, text: &str) -> Result<SymptomData, String> {
        let trimmed = text.trim();
        if trimmed.chars().count() < self.config.min_chars {
            return Err("insufficient symptom detail: description too short".to_string());
        }
        extract(trimmed)
            .ok_or_else(|| "insufficient symptom detail: no recognisable symptoms".to_string())
    }
}

#[async_trait]
impl TriageStage for SymptomIntakeStage {
    fn stage(&self) -> PipelineStage {
        PipelineStage::SymptomIntake
    }

    async fn run(&self, ctx: &AnalysisContext, _original_input: &str) -> StageOutput {
        let result = self.evaluate(ctx.user_input());
        if let Ok(data) = &result {
            debug!(
                symptoms = ?data.symptoms,
                cues = data.severity_cues.len(),
                species = ?data.species,
                "Symptoms extracted"
            );
        }
        finish(result)
    }
}
