use chrono::{DateTime, Datelike, TimeZone, Timelike};
use rand::Rng;

const KEY_CHARS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const KEY_SUFFIX_LEN: usize = 10;

/// 物件名稱：日期時間 (不補零) + 10 個隨機字元
pub fn file_name<Tz: TimeZone, R: Rng + ?Sized>(
    now: &DateTime<Tz>,
    rng: &mut R,
    extension: &str,
) -> String {
    let suffix: String = (0..KEY_SUFFIX_LEN)
        .map(|_| KEY_CHARS[rng.gen_range(0..KEY_CHARS.len())] as char)
        .collect();

    format!(
        "{}{}{}{}{}{}{}.{}",
        now.year(),
        now.month(),
        now.day(),
        now.hour(),
        now.minute(),
        now.second(),
        suffix,
        extension
    )
}

/// `base_path/file_name`，去除多餘的斜線
pub fn object_key(base_path: &str, file_name: &str) -> String {
    let base = base_path.trim_matches('/');
    if base.is_empty() {
        file_name.to_string()
    } else {
        format!("{}/{}", base, file_name)
    }
}

pub fn public_url(endpoint: &str, key: &str) -> String {
    format!("{}/{}", endpoint.trim_end_matches('/'), key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_file_name_is_unpadded_timestamp_plus_suffix() {
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 7, 8, 9).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let name = file_name(&now, &mut rng, "png");

        assert!(name.starts_with("202435789"));
        assert!(name.ends_with(".png"));
        let suffix = &name["202435789".len()..name.len() - ".png".len()];
        assert_eq!(suffix.len(), 10);
        assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_file_names_differ_between_calls() {
        let now = Utc.with_ymd_and_hms(2024, 12, 25, 23, 59, 59).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert_ne!(file_name(&now, &mut rng, "png"), file_name(&now, &mut rng, "png"));
    }

    #[test]
    fn test_object_key_and_url() {
        assert_eq!(object_key("/upload/charts/", "a.png"), "upload/charts/a.png");
        assert_eq!(object_key("", "a.png"), "a.png");
        assert_eq!(
            public_url("https://cdn.example.com/", "upload/charts/a.png"),
            "https://cdn.example.com/upload/charts/a.png"
        );
    }
}
