pub const USER_COUNT_PER_PAGE: i64 = 6;
pub const RECIPE_COUNT_PER_PAGE: i64 = 6;
pub const SUBSCRIPTION_COUNT_PER_PAGE: i64 = 6;
pub const MAX_COUNT_PER_PAGE: i64 = 100;

pub const MIN_AMOUNT_VALUE: i32 = 1;
pub const MAX_AMOUNT_VALUE: i32 = 32767;

pub const LONG_LENGTH: usize = 200;
pub const NAME_LENGTH: usize = 150;
pub const EMAIL_LENGTH: usize = 254;
pub const HEX_LENGTH: usize = 7;
pub const MIN_PASSWORD_LENGTH: usize = 8;

pub const SHOPPING_LIST_HEADER: &str = "Shopping list";
pub const SHOPPING_LIST_FILENAME: &str = "shopping_list.txt";

pub const IMAGE_MIME_TYPES: &[&str] = &["png", "jpeg", "jpg", "gif", "webp"];
pub const MAX_BODY_SIZE: u64 = 16 * 1024 * 1024;
pub const CACHE_TTL_SECONDS: u64 = 60 * 60;
