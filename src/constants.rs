// Replay Keeper Constants
// Formats here are shared with catalogs and preference files written by earlier builds.

// Paths (relative to the app home directory)
pub const ASSETS_FOLDER: &str = "assets";
pub const PORTRAITS_FOLDER: &str = "portraits";
pub const RANK_PORTRAITS_FOLDER: &str = "rank images";
pub const QUOTES_FOLDER: &str = "quotes";
pub const QUOTES_FILENAME: &str = "character_quotes.json";
pub const ACTIVE_DB_FOLDER: &str = "udc";
pub const BACKUP_DB_FOLDER: &str = "udc_backups";
pub const PREFERENCES_FILENAME: &str = "preferences.json";

/// Environment override for the app home directory
pub const HOME_ENV_VAR: &str = "RKM_HOME";

// Catalog files
pub const CATALOG_EXTENSION: &str = "db";
pub const CATALOG_FILE_PREFIX: &str = "replays_UDC-";

// Identifiers
pub const UFC_PREFIX: &str = "UFC-";
pub const UFC_LENGTH: usize = 4;
pub const UDC_LENGTH: usize = 8;
/// Attempts at a fresh UFC before giving up on an add
pub const UFC_MAX_ATTEMPTS: usize = 8;

// Date formats
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const LEGACY_DATE_FORMAT: &str = "%m-%d-%Y %H:%M:%S";
pub const NAME_TIMESTAMP_FORMAT: &str = "%m-%d-%Y_%H-%M-%S";
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

// Recycle bin retention
pub const RECYCLE_BIN_AUTO_DELETE_DAYS: i64 = 30;
pub const RECYCLE_BIN_CHECK_INTERVAL_SECS: u64 = 300; // 5 minutes

// Portraits
pub const PORTRAIT_SIZE_SMALL: u32 = 160;
pub const PORTRAIT_SIZE_MAIN: u32 = 220;
pub const PORTRAIT_CACHE_CAPACITY: usize = 64;
pub const PORTRAIT_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];
pub const PORTRAIT_NAME_SUFFIXES: [&str; 8] = [
    "_portrait", "-portrait", "_icon", "-icon",
    "_badge", "-badge", "_img", "-img",
];

// Quotes
pub const NO_QUOTE_PLACEHOLDER: &str = "No quotes available";

// Preferences
pub const DEFAULT_ALT_CHARACTERS: [&str; 3] = ["Dhalsim", "Elena", "Cammy"];
