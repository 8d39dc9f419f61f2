//! Creation requests, partial updates and editable-field allowlists

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use super::model::{
    Character, CharacterDraft, CharacterKind, CreatureSheet, PlayerSheet, Sheet, Vital,
    VitalField, DEFAULT_VITAL,
};
use super::stats::Stats;
use crate::error::ValidationError;

/// An editable character field, named by its wire key
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Name,
    CurrentHp,
    MaxHp,
    CurrentStam,
    MaxStam,
    Title,
    Sin,
    Virtue,
    GeneralFeeling,
    SkillName,
    SkillDescription,
    PassiveName,
    PassiveDescription,
    StarterBackground,
    Age,
    Gender,
    Temperature,
    Saturation,
    Biology,
    MainStyle,
    Ritual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueKind {
    Text,
    Integer,
    Number,
}

impl Field {
    pub const ALL: [Field; 21] = [
        Field::Name,
        Field::CurrentHp,
        Field::MaxHp,
        Field::CurrentStam,
        Field::MaxStam,
        Field::Title,
        Field::Sin,
        Field::Virtue,
        Field::GeneralFeeling,
        Field::SkillName,
        Field::SkillDescription,
        Field::PassiveName,
        Field::PassiveDescription,
        Field::StarterBackground,
        Field::Age,
        Field::Gender,
        Field::Temperature,
        Field::Saturation,
        Field::Biology,
        Field::MainStyle,
        Field::Ritual,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::CurrentHp => "current_hp",
            Field::MaxHp => "max_hp",
            Field::CurrentStam => "current_stam",
            Field::MaxStam => "max_stam",
            Field::Title => "title",
            Field::Sin => "sin",
            Field::Virtue => "virtue",
            Field::GeneralFeeling => "general_feeling",
            Field::SkillName => "skill_name",
            Field::SkillDescription => "skill_description",
            Field::PassiveName => "passive_name",
            Field::PassiveDescription => "passive_description",
            Field::StarterBackground => "starter_background",
            Field::Age => "age",
            Field::Gender => "gender",
            Field::Temperature => "temperature",
            Field::Saturation => "saturation",
            Field::Biology => "biology",
            Field::MainStyle => "main_style",
            Field::Ritual => "ritual",
        }
    }

    pub fn from_key(key: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.key() == key)
    }

    /// The vital this field addresses, if it is one
    pub fn vital(self) -> Option<VitalField> {
        match self {
            Field::CurrentHp => Some(VitalField::CurrentHp),
            Field::MaxHp => Some(VitalField::MaxHp),
            Field::CurrentStam => Some(VitalField::CurrentStam),
            Field::MaxStam => Some(VitalField::MaxStam),
            _ => None,
        }
    }

    /// Fields that only exist on a player sheet
    pub fn player_only(self) -> bool {
        matches!(
            self,
            Field::GeneralFeeling
                | Field::PassiveName
                | Field::PassiveDescription
                | Field::StarterBackground
                | Field::Temperature
                | Field::Saturation
        )
    }

    fn value_kind(self) -> ValueKind {
        match self {
            Field::CurrentHp | Field::MaxHp | Field::CurrentStam | Field::MaxStam => {
                ValueKind::Number
            }
            Field::Age | Field::Temperature => ValueKind::Integer,
            _ => ValueKind::Text,
        }
    }
}

impl From<VitalField> for Field {
    fn from(v: VitalField) -> Field {
        match v {
            VitalField::CurrentHp => Field::CurrentHp,
            VitalField::MaxHp => Field::MaxHp,
            VitalField::CurrentStam => Field::CurrentStam,
            VitalField::MaxStam => Field::MaxStam,
        }
    }
}

/// Everything the host may edit: name, vitals and the narrative sheet.
/// Roll history and stats are deliberately absent.
pub const HOST_EDITABLE: &[Field] = &Field::ALL;

/// What a player may change on their own sheet
pub const SELF_EDITABLE: &[Field] = &[
    Field::Name,
    Field::SkillName,
    Field::SkillDescription,
    Field::StarterBackground,
    Field::Gender,
];

#[derive(Debug, Clone, PartialEq)]
enum FieldValue {
    Text(String),
    Integer(i64),
    Number(f64),
}

/// A partial update. Fields left unset are untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CharacterUpdate {
    values: BTreeMap<Field, FieldValue>,
}

impl CharacterUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a vital value (clamped when applied)
    pub fn vital(mut self, field: VitalField, value: f64) -> Self {
        self.values.insert(field.into(), FieldValue::Number(value));
        self
    }

    pub fn name(self, name: impl Into<String>) -> Self {
        self.text(Field::Name, name)
    }

    /// Set a text field
    pub fn text(mut self, field: Field, value: impl Into<String>) -> Self {
        debug_assert_eq!(field.value_kind(), ValueKind::Text);
        self.values.insert(field, FieldValue::Text(value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Fields this update touches
    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.values.keys().copied()
    }

    /// Vital fields this update touches
    pub fn vital_fields(&self) -> Vec<VitalField> {
        self.fields().filter_map(Field::vital).collect()
    }

    /// Parse a JSON object of edits, accepting only `allowed` keys
    pub fn from_json(body: &Value, allowed: &[Field]) -> Result<Self, ValidationError> {
        let object = body.as_object().ok_or(ValidationError::NotAnObject)?;
        let mut update = CharacterUpdate::new();

        for (key, value) in object {
            let field = Field::from_key(key)
                .filter(|f| allowed.contains(f))
                .ok_or_else(|| ValidationError::FieldNotEditable(key.clone()))?;

            let parsed = match field.value_kind() {
                ValueKind::Number => value
                    .as_f64()
                    .filter(|v| v.is_finite())
                    .map(FieldValue::Number)
                    .ok_or_else(|| ValidationError::NonNumeric(key.clone()))?,
                ValueKind::Integer => value.as_i64().map(FieldValue::Integer).ok_or_else(|| {
                    ValidationError::WrongType {
                        field: key.clone(),
                        expected: "integer",
                    }
                })?,
                ValueKind::Text => value
                    .as_str()
                    .map(|s| FieldValue::Text(s.to_string()))
                    .ok_or_else(|| ValidationError::WrongType {
                        field: key.clone(),
                        expected: "string",
                    })?,
            };
            update.values.insert(field, parsed);
        }

        Ok(update)
    }

    /// Check the update against a character without changing it
    pub fn validate(&self, kind: CharacterKind) -> Result<(), ValidationError> {
        for (field, value) in &self.values {
            if field.player_only() && kind != CharacterKind::Player {
                return Err(ValidationError::NotApplicable {
                    field: field.key(),
                    kind,
                });
            }
            match value {
                FieldValue::Number(v) if !v.is_finite() => {
                    return Err(ValidationError::NonNumeric(field.key().to_string()));
                }
                FieldValue::Text(s) if *field == Field::Name && s.trim().is_empty() => {
                    return Err(ValidationError::MissingField("name"));
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Validate, then apply. Maxima go first so that currents are clamped
    /// against the new ceiling.
    pub fn apply_to(&self, character: &mut Character) -> Result<(), ValidationError> {
        self.validate(character.kind())?;

        for (field, value) in &self.values {
            match (field, value) {
                (Field::MaxHp, FieldValue::Number(v)) => character.hp.set_max(*v),
                (Field::MaxStam, FieldValue::Number(v)) => character.stamina.set_max(*v),
                _ => {}
            }
        }

        for (field, value) in &self.values {
            match (field, value) {
                (Field::CurrentHp, FieldValue::Number(v)) => character.hp.set_current(*v),
                (Field::CurrentStam, FieldValue::Number(v)) => character.stamina.set_current(*v),
                (Field::Name, FieldValue::Text(s)) => character.name = s.trim().to_string(),
                (f, FieldValue::Text(s)) => apply_text(&mut character.sheet, *f, s.clone()),
                (f, FieldValue::Integer(n)) => apply_integer(&mut character.sheet, *f, *n),
                _ => {}
            }
        }

        Ok(())
    }
}

fn apply_text(sheet: &mut Sheet, field: Field, value: String) {
    match sheet {
        Sheet::Player(p) => match field {
            Field::Title => p.title = Some(value),
            Field::Sin => p.sin = Some(value),
            Field::Virtue => p.virtue = Some(value),
            Field::GeneralFeeling => p.general_feeling = value,
            Field::SkillName => p.skill_name = value,
            Field::SkillDescription => p.skill_description = value,
            Field::PassiveName => p.passive_name = Some(value),
            Field::PassiveDescription => p.passive_description = Some(value),
            Field::StarterBackground => p.starter_background = value,
            Field::Gender => p.gender = value,
            Field::Saturation => p.saturation = value,
            Field::Biology => p.biology = value,
            Field::MainStyle => p.main_style = Some(value),
            Field::Ritual => p.ritual = value,
            _ => {}
        },
        Sheet::Enemy(c) | Sheet::Npc(c) => match field {
            Field::Title => c.title = Some(value),
            Field::Sin => c.sin = Some(value),
            Field::Virtue => c.virtue = Some(value),
            Field::SkillName => c.skill_name = Some(value),
            Field::SkillDescription => c.skill_description = Some(value),
            Field::Gender => c.gender = value,
            Field::Biology => c.biology = value,
            Field::MainStyle => c.main_style = Some(value),
            Field::Ritual => c.ritual = value,
            _ => {}
        },
    }
}

fn apply_integer(sheet: &mut Sheet, field: Field, value: i64) {
    match (sheet, field) {
        (Sheet::Player(p), Field::Age) => p.age = value,
        (Sheet::Player(p), Field::Temperature) => p.temperature = Some(value),
        (Sheet::Enemy(c) | Sheet::Npc(c), Field::Age) => c.age = Some(value),
        _ => {}
    }
}

/// A creation request as posted by the creation form or the host
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewCharacter {
    pub name: Option<String>,
    pub gender: Option<String>,
    pub skill_name: Option<String>,
    pub skill_description: Option<String>,
    pub starter_background: Option<String>,
    pub title: Option<String>,
    pub sin: Option<String>,
    pub virtue: Option<String>,
    pub general_feeling: Option<String>,
    pub passive_name: Option<String>,
    pub passive_description: Option<String>,
    pub age: Option<i64>,
    pub temperature: Option<i64>,
    pub saturation: Option<String>,
    pub biology: Option<String>,
    pub main_style: Option<String>,
    pub ritual: Option<String>,
    pub current_hp: Option<f64>,
    pub max_hp: Option<f64>,
    pub current_stam: Option<f64>,
    pub max_stam: Option<f64>,
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    match value {
        Some(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(ValidationError::MissingField(field)),
    }
}

fn vital(
    current: Option<f64>,
    max: Option<f64>,
    current_key: &str,
    max_key: &str,
) -> Result<Vital, ValidationError> {
    let max = max.unwrap_or(DEFAULT_VITAL);
    if !max.is_finite() {
        return Err(ValidationError::NonNumeric(max_key.to_string()));
    }
    let current = current.unwrap_or(max);
    if !current.is_finite() {
        return Err(ValidationError::NonNumeric(current_key.to_string()));
    }
    Ok(Vital::new(current, max))
}

impl NewCharacter {
    /// Minimal request for an enemy or NPC
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Complete player request with the required fields set
    pub fn player(
        name: impl Into<String>,
        gender: impl Into<String>,
        skill_name: impl Into<String>,
        skill_description: impl Into<String>,
        starter_background: impl Into<String>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            gender: Some(gender.into()),
            skill_name: Some(skill_name.into()),
            skill_description: Some(skill_description.into()),
            starter_background: Some(starter_background.into()),
            ..Self::default()
        }
    }

    /// Validate the request and build the record for `kind`
    pub fn into_draft(self, kind: CharacterKind) -> Result<CharacterDraft, ValidationError> {
        let name = required(self.name, "name")?;
        let hp = vital(self.current_hp, self.max_hp, "current_hp", "max_hp")?;
        let stamina = vital(self.current_stam, self.max_stam, "current_stam", "max_stam")?;

        let (stats, sheet) = match kind {
            CharacterKind::Player => {
                let gender = required(self.gender, "gender")?;
                let skill_name = required(self.skill_name, "skill_name")?;
                let skill_description = required(self.skill_description, "skill_description")?;
                let starter_background = required(self.starter_background, "starter_background")?;

                let stats = Stats::for_background(&starter_background);
                let sheet = Sheet::Player(PlayerSheet {
                    title: self.title,
                    sin: self.sin,
                    virtue: self.virtue,
                    general_feeling: self.general_feeling.unwrap_or_else(|| "Good".to_string()),
                    skill_name,
                    skill_description,
                    passive_name: self.passive_name,
                    passive_description: self.passive_description,
                    starter_background,
                    age: self.age.unwrap_or(16),
                    gender,
                    temperature: self.temperature,
                    saturation: self.saturation.unwrap_or_else(|| "Full".to_string()),
                    biology: self.biology.unwrap_or_else(|| "Human".to_string()),
                    main_style: self.main_style,
                    ritual: self.ritual.unwrap_or_else(|| "0% Human".to_string()),
                });
                (stats, sheet)
            }
            CharacterKind::Enemy | CharacterKind::Npc => {
                let player_only = [
                    ("general_feeling", self.general_feeling.is_some()),
                    ("passive_name", self.passive_name.is_some()),
                    ("passive_description", self.passive_description.is_some()),
                    ("starter_background", self.starter_background.is_some()),
                    ("temperature", self.temperature.is_some()),
                    ("saturation", self.saturation.is_some()),
                ];
                if let Some((field, _)) = player_only.into_iter().find(|(_, set)| *set) {
                    return Err(ValidationError::NotApplicable { field, kind });
                }

                let creature = CreatureSheet {
                    title: self.title,
                    sin: self.sin,
                    virtue: self.virtue,
                    skill_name: self.skill_name,
                    skill_description: self.skill_description,
                    age: self.age,
                    gender: self.gender.unwrap_or_else(|| "Male".to_string()),
                    biology: self.biology.unwrap_or_else(|| "Human".to_string()),
                    main_style: self.main_style,
                    ritual: self.ritual.unwrap_or_else(|| "0% Human".to_string()),
                };
                let sheet = if kind == CharacterKind::Enemy {
                    Sheet::Enemy(creature)
                } else {
                    Sheet::Npc(creature)
                };
                (Stats::default(), sheet)
            }
        };

        Ok(CharacterDraft {
            name,
            hp,
            stamina,
            stats,
            sheet,
        })
    }
}
