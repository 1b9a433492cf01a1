pub mod hardware_utils;
pub mod json_utils;
pub mod playlist_utils;
pub mod response_utils;
pub mod url_utils;
