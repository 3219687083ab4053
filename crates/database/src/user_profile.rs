//! Health profile storage.

use sqlx::SqlitePool;

use crate::models::UserProfile;
use crate::validation::{
    parse_number, validate_range, validate_text, ValidationError, MAX_LABEL_LENGTH,
    MAX_TEXT_LENGTH,
};
use crate::Result;

/// Profile field identifiers for updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    Age,
    HeightCm,
    WeightKg,
    ActivityLevel,
    GoalsText,
    Conditions,
    Medications,
    Timezone,
}

impl ProfileField {
    /// Get the database column name for this field.
    pub fn column_name(&self) -> &'static str {
        match self {
            ProfileField::Age => "age",
            ProfileField::HeightCm => "height_cm",
            ProfileField::WeightKg => "weight_kg",
            ProfileField::ActivityLevel => "activity_level",
            ProfileField::GoalsText => "goals_text",
            ProfileField::Conditions => "conditions",
            ProfileField::Medications => "medications",
            ProfileField::Timezone => "timezone",
        }
    }

    /// Parse a field name from user input.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "age" => Some(ProfileField::Age),
            "height_cm" | "height" => Some(ProfileField::HeightCm),
            "weight_kg" | "weight" => Some(ProfileField::WeightKg),
            "activity_level" | "activity" => Some(ProfileField::ActivityLevel),
            "goals_text" | "goals" => Some(ProfileField::GoalsText),
            "conditions" => Some(ProfileField::Conditions),
            "medications" | "supplements" => Some(ProfileField::Medications),
            "timezone" | "tz" => Some(ProfileField::Timezone),
            _ => None,
        }
    }

    /// Get a human-readable display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            ProfileField::Age => "age",
            ProfileField::HeightCm => "height (cm)",
            ProfileField::WeightKg => "weight (kg)",
            ProfileField::ActivityLevel => "activity level",
            ProfileField::GoalsText => "goals",
            ProfileField::Conditions => "conditions",
            ProfileField::Medications => "medications",
            ProfileField::Timezone => "timezone",
        }
    }

    /// Validate raw input for this field into a bindable value.
    pub fn parse_value(&self, raw: &str) -> std::result::Result<ProfileValue, ValidationError> {
        let name = self.display_name();
        match self {
            ProfileField::Age => {
                let n = parse_number(name, raw)?;
                validate_range(name, n, 0.0, 120.0)?;
                if n.fract() != 0.0 {
                    return Err(ValidationError::InvalidNumber {
                        field: name.to_string(),
                        value: raw.to_string(),
                    });
                }
                Ok(ProfileValue::Integer(n as i64))
            }
            ProfileField::HeightCm => {
                let n = parse_number(name, raw)?;
                validate_range(name, n, 0.0, 300.0)?;
                Ok(ProfileValue::Real(n))
            }
            ProfileField::WeightKg => {
                let n = parse_number(name, raw)?;
                validate_range(name, n, 0.0, 500.0)?;
                Ok(ProfileValue::Real(n))
            }
            ProfileField::ActivityLevel | ProfileField::Timezone => {
                validate_text(name, raw, MAX_LABEL_LENGTH)?;
                Ok(ProfileValue::Text(raw.trim().to_string()))
            }
            ProfileField::GoalsText | ProfileField::Conditions | ProfileField::Medications => {
                validate_text(name, raw, MAX_TEXT_LENGTH)?;
                Ok(ProfileValue::Text(raw.trim().to_string()))
            }
        }
    }
}

/// A validated profile value ready to bind.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileValue {
    Integer(i64),
    Real(f64),
    Text(String),
}

/// Get a user's profile.
pub async fn get_profile(pool: &SqlitePool, user_id: &str) -> Result<Option<UserProfile>> {
    let record = sqlx::query_as::<_, UserProfile>(
        r#"
        SELECT user_id, age, height_cm, weight_kg, activity_level, goals_text,
               conditions, medications, timezone, created_at, updated_at
        FROM user_profiles
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// Create or replace a user's whole profile (sign-up and profile form save).
pub async fn upsert_profile(pool: &SqlitePool, profile: &UserProfile) -> Result<()> {
    if let Some(age) = profile.age {
        validate_range("age", age as f64, 0.0, 120.0)?;
    }
    if let Some(height) = profile.height_cm {
        validate_range("height (cm)", height, 0.0, 300.0)?;
    }
    if let Some(weight) = profile.weight_kg {
        validate_range("weight (kg)", weight, 0.0, 500.0)?;
    }
    for (field, value, max) in [
        ("activity level", &profile.activity_level, MAX_LABEL_LENGTH),
        ("timezone", &profile.timezone, MAX_LABEL_LENGTH),
        ("goals", &profile.goals_text, MAX_TEXT_LENGTH),
        ("conditions", &profile.conditions, MAX_TEXT_LENGTH),
        ("medications", &profile.medications, MAX_TEXT_LENGTH),
    ] {
        if let Some(value) = value {
            validate_text(field, value, max)?;
        }
    }

    sqlx::query(
        r#"
        INSERT INTO user_profiles (
            user_id, age, height_cm, weight_kg, activity_level, goals_text,
            conditions, medications, timezone
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(user_id) DO UPDATE SET
            age = excluded.age,
            height_cm = excluded.height_cm,
            weight_kg = excluded.weight_kg,
            activity_level = excluded.activity_level,
            goals_text = excluded.goals_text,
            conditions = excluded.conditions,
            medications = excluded.medications,
            timezone = excluded.timezone,
            updated_at = datetime('now')
        "#,
    )
    .bind(&profile.user_id)
    .bind(profile.age)
    .bind(profile.height_cm)
    .bind(profile.weight_kg)
    .bind(&profile.activity_level)
    .bind(&profile.goals_text)
    .bind(&profile.conditions)
    .bind(&profile.medications)
    .bind(&profile.timezone)
    .execute(pool)
    .await?;

    Ok(())
}

/// Update a single field in a user's profile.
///
/// Creates the profile if it doesn't exist.
/// If value is None, clears the field.
pub async fn update_profile_field(
    pool: &SqlitePool,
    user_id: &str,
    field: ProfileField,
    value: Option<&str>,
) -> Result<()> {
    let value = value.map(|raw| field.parse_value(raw)).transpose()?;

    // Column names can't be bound; they come from the ProfileField enum.
    let column = field.column_name();
    let query = format!(
        r#"
        INSERT INTO user_profiles (user_id, {column})
        VALUES (?, ?)
        ON CONFLICT(user_id) DO UPDATE SET
            {column} = excluded.{column},
            updated_at = datetime('now')
        "#,
        column = column
    );

    let query = sqlx::query(&query).bind(user_id);
    let query = match value {
        Some(ProfileValue::Integer(n)) => query.bind(n),
        Some(ProfileValue::Real(n)) => query.bind(n),
        Some(ProfileValue::Text(s)) => query.bind(s),
        None => query.bind(Option::<String>::None),
    };
    query.execute(pool).await?;

    Ok(())
}

/// Delete a user's entire profile.
///
/// Returns true if a profile was deleted, false if none existed.
pub async fn delete_profile(pool: &SqlitePool, user_id: &str) -> Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM user_profiles
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
