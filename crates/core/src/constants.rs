//! Constants used throughout the Sentinel core crate.
//!
//! Collection names, option lists and user-facing message text live here so the step tables,
//! controllers and tests all agree on the exact strings.

/// Collection holding one document per registered resident.
pub const USERS_COLLECTION: &str = "users";

/// Collection holding symptom reports.
pub const SYMPTOM_REPORTS_COLLECTION: &str = "symptomReports";

/// Collection holding community health announcements.
pub const ANNOUNCEMENTS_COLLECTION: &str = "announcements";

/// Collection holding one health QR code per resident.
pub const USER_QR_CODES_COLLECTION: &str = "userQRCodes";

/// Country calling code prepended to the subscriber digits for usernames.
pub const DEFAULT_CALLING_CODE: &str = "+63";

/// The community-role sentinel that makes the free-text role field required.
pub const OTHER_ROLE: &str = "Other (Specify)";

/// Community roles offered during registration.
pub const COMMUNITY_ROLES: &[&str] = &[
    "Resident",
    "Barangay Health Worker",
    "Barangay Official",
    "Teacher",
    OTHER_ROLE,
];

/// Identity documents accepted for verification.
pub const ID_TYPES: &[&str] = &[
    "Driver's License",
    "Passport",
    "National ID",
    "Voter's ID",
    "SSS ID",
    "UMID",
];

/// Checkbox symptoms offered by the report flow.
pub const COMMON_SYMPTOMS: &[&str] = &[
    "Fever",
    "Cough",
    "Headache",
    "Sore Throat",
    "Fatigue",
    "Body Aches",
    "Runny Nose",
    "Difficulty Breathing",
    "Nausea",
    "Vomiting",
    "Diarrhea",
    "Loss of Taste/Smell",
    "Rash",
    "Chills",
    "Chest Pain",
    "Abdominal Pain",
    "Dizziness",
    "Joint Pain",
];

/// Characters that satisfy the special-character password rule.
pub const PASSWORD_SPECIAL_CHARS: &str = "!@#$%^&*(),.?\":{}|<>";

/// Minimum password length.
pub const PASSWORD_MIN_LENGTH: usize = 8;

/// Upper bound on the unread-announcement badge.
pub const DEFAULT_UNREAD_CAP: usize = 99;

/// Seconds a new-announcement notification stays visible before closing itself.
pub const DEFAULT_NOTIFICATION_TTL_SECS: u64 = 30;

/// Default chat model for the health guide.
pub const DEFAULT_GUIDE_MODEL: &str = "gpt-3.5-turbo";

/// Default completion budget for the health guide.
pub const DEFAULT_GUIDE_MAX_TOKENS: u32 = 250;

/// Default sampling temperature for the health guide.
pub const DEFAULT_GUIDE_TEMPERATURE: f32 = 0.7;

/// How far back the guide looks when summarising a user's reports.
pub const DEFAULT_GUIDE_LOOKBACK_DAYS: i64 = 7;

/// Message shown when the persistence collaborator is unreachable.
pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please check your internet connection.";

/// Message shown for failures that could not be classified.
pub const UNKNOWN_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

/// Message shown when the contact number is already in the user directory.
pub const DUPLICATE_CONTACT_MESSAGE: &str = "Contact number already registered";

/// Message shown when the identity provider already has the email.
pub const DUPLICATE_EMAIL_MESSAGE: &str = "Email address already registered";
