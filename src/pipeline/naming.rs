// 出力ファイル名 (YYYY-MM-DD-<uuid>.pdf) とアイテムIDの生成

use chrono::{DateTime, TimeZone};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Hex digits of the source digest kept in an item identifier.
const ITEM_ID_LEN: usize = 12;

/// `YYYY-MM-DD-<id>.pdf`, dated by the source document's creation time.
pub fn output_filename<Tz: TimeZone>(created: &DateTime<Tz>, id: &Uuid) -> String {
    format!("{}-{}.pdf", created.date_naive().format("%Y-%m-%d"), id)
}

/// [`output_filename`] with a fresh random identifier.
pub fn new_output_filename<Tz: TimeZone>(created: &DateTime<Tz>) -> String {
    output_filename(created, &Uuid::new_v4())
}

/// ソースバイト列のSHA-256先頭12桁をアイテムIDとする。
pub fn item_id(source: &[u8]) -> String {
    let digest = hex::encode(Sha256::digest(source));
    digest[..ITEM_ID_LEN].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    #[test]
    fn test_filename_uses_creation_date() {
        let created = Utc.with_ymd_and_hms(2024, 3, 5, 23, 59, 0).unwrap();
        let id = Uuid::parse_str("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap();
        assert_eq!(
            output_filename(&created, &id),
            "2024-03-05-67e55044-10b1-426f-9247-bb680e5fe0c8.pdf"
        );
    }

    #[test]
    fn test_filename_date_is_in_the_timestamps_own_zone() {
        let tz = FixedOffset::east_opt(9 * 3600).unwrap();
        let created = tz.with_ymd_and_hms(2024, 1, 1, 3, 0, 0).unwrap();
        assert!(new_output_filename(&created).starts_with("2024-01-01-"));
    }

    #[test]
    fn test_fresh_filenames_differ() {
        let created = Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap();
        assert_ne!(new_output_filename(&created), new_output_filename(&created));
    }

    #[test]
    fn test_item_id_is_stable_prefix_of_digest() {
        let id = item_id(b"%PDF-1.4");
        assert_eq!(id.len(), 12);
        assert_eq!(id, item_id(b"%PDF-1.4"));
        assert_ne!(id, item_id(b"%PDF-1.5"));
    }
}
