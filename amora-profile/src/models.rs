use chrono::{DateTime, Duration, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::schema::{
    profile_blocks, profile_complaints, profile_filters, profile_images, profile_likes,
    profile_navigators, profile_reviews, profiles,
};

/// A profile counts as online for this long after its last interaction.
pub const ONLINE_WINDOW_SECS: i64 = 5 * 60;

// --- Gender ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Man,
    Woman,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Man => "man",
            Gender::Woman => "woman",
        }
    }
}

impl FromStr for Gender {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "man" => Ok(Gender::Man),
            "woman" => Ok(Gender::Woman),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchGender {
    Man,
    Woman,
    All,
}

impl SearchGender {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchGender::Man => "man",
            SearchGender::Woman => "woman",
            SearchGender::All => "all",
        }
    }

    /// `None` means any gender is acceptable.
    pub fn gender(&self) -> Option<Gender> {
        match self {
            SearchGender::Man => Some(Gender::Man),
            SearchGender::Woman => Some(Gender::Woman),
            SearchGender::All => None,
        }
    }
}

impl FromStr for SearchGender {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(SearchGender::All),
            other => other.parse::<Gender>().map(|g| match g {
                Gender::Man => SearchGender::Man,
                Gender::Woman => SearchGender::Woman,
            }),
        }
    }
}

// --- Profile ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = profiles)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Uuid,
    pub credential_id: Uuid,
    pub telegram_id: Option<i64>,
    pub display_name: String,
    pub birthday: NaiveDate,
    pub gender: String,
    pub search_gender: String,
    pub looking_for: String,
    pub height: Option<i32>,
    pub weight: Option<i32>,
    pub description: String,
    pub location: String,
    pub is_deleted: bool,
    pub is_blocked: bool,
    pub is_premium: bool,
    pub is_show_distance: bool,
    pub is_invisible: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_online: DateTime<Utc>,
}

impl Profile {
    pub fn is_online(&self, now: DateTime<Utc>) -> bool {
        is_online(self.last_online, now)
    }
}

pub fn is_online(last_online: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now - last_online < Duration::seconds(ONLINE_WINDOW_SECS)
}

#[derive(Debug, Insertable, Clone)]
#[diesel(table_name = profiles)]
pub struct NewProfile {
    pub id: Uuid,
    pub credential_id: Uuid,
    pub telegram_id: Option<i64>,
    pub display_name: String,
    pub birthday: NaiveDate,
    pub gender: String,
    pub search_gender: String,
    pub looking_for: String,
    pub height: Option<i32>,
    pub weight: Option<i32>,
    pub description: String,
    pub location: String,
    pub is_show_distance: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_online: DateTime<Utc>,
}

#[derive(Debug, AsChangeset, Default, Clone)]
#[diesel(table_name = profiles)]
pub struct UpdateProfile {
    pub telegram_id: Option<i64>,
    pub display_name: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub gender: Option<String>,
    pub search_gender: Option<String>,
    pub looking_for: Option<String>,
    pub height: Option<i32>,
    pub weight: Option<i32>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub is_show_distance: Option<bool>,
    pub is_invisible: Option<bool>,
}

// --- Navigator ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = profile_navigators)]
#[serde(rename_all = "camelCase")]
pub struct Navigator {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = profile_navigators)]
pub struct NewNavigator {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Filter ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = profile_filters)]
#[serde(rename_all = "camelCase")]
pub struct FilterPreference {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub search_gender: String,
    pub looking_for: String,
    pub age_from: i32,
    pub age_to: i32,
    #[serde(rename = "distance")]
    pub distance_km: i32,
    pub page: i32,
    pub size: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = profile_filters)]
pub struct NewFilter {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub search_gender: String,
    pub looking_for: String,
    pub age_from: i32,
    pub age_to: i32,
    pub distance_km: i32,
    pub page: i32,
    pub size: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Image ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = profile_images)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub name: String,
    pub url: String,
    #[serde(skip)]
    pub object_key: String,
    pub size: i64,
    pub is_primary: bool,
    pub is_private: bool,
    pub is_blocked: bool,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Image {
    pub fn is_public(&self) -> bool {
        !self.is_deleted && !self.is_blocked && !self.is_private
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = profile_images)]
pub struct NewImage {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub name: String,
    pub url: String,
    pub object_key: String,
    pub size: i64,
    pub is_primary: bool,
    pub is_private: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, AsChangeset, Deserialize, Default, Clone)]
#[diesel(table_name = profile_images)]
#[serde(rename_all = "camelCase")]
pub struct UpdateImage {
    pub is_primary: Option<bool>,
    pub is_private: Option<bool>,
}

// --- Like ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = profile_likes)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub liked_profile_id: Uuid,
    pub is_liked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = profile_likes)]
pub struct NewLike {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub liked_profile_id: Uuid,
    pub is_liked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Block ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = profile_blocks)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub blocked_profile_id: Uuid,
    pub is_blocked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = profile_blocks)]
pub struct NewBlock {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub blocked_profile_id: Uuid,
    pub is_blocked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Complaint ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = profile_complaints)]
#[serde(rename_all = "camelCase")]
pub struct Complaint {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub accused_profile_id: Uuid,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = profile_complaints)]
pub struct NewComplaint {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub accused_profile_id: Uuid,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

// --- Review ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = profile_reviews)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub message: String,
    pub rating: f32,
    pub has_deleted: bool,
    pub has_edited: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = profile_reviews)]
pub struct NewReview {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub message: String,
    pub rating: f32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, AsChangeset, Default, Clone)]
#[diesel(table_name = profile_reviews)]
pub struct UpdateReview {
    pub message: Option<String>,
    pub rating: Option<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_gender_parses_all_and_genders() {
        assert_eq!("all".parse::<SearchGender>(), Ok(SearchGender::All));
        assert_eq!("woman".parse::<SearchGender>(), Ok(SearchGender::Woman));
        assert!("any".parse::<SearchGender>().is_err());
        assert_eq!(SearchGender::All.gender(), None);
        assert_eq!(SearchGender::Man.gender(), Some(Gender::Man));
    }

    #[test]
    fn online_window_is_five_minutes() {
        let now = Utc::now();
        assert!(is_online(now - Duration::seconds(299), now));
        assert!(!is_online(now - Duration::seconds(300), now));
    }
}
