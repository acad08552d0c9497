//! Keyword-based query classification.
//!
//! A normalized query is scored against every keyword bucket, then the
//! first bucket with a non-zero score in [`PRIORITY`] order decides the
//! `(category, subject)` label. The highest score does not win; a single
//! procedural keyword outranks any number of contact keywords.

use crate::keywords;
use crate::text::normalize_text;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Top-level document category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Administrative procedures
    ThuTucHanhChinh,
    /// Information about the ward itself
    ThongTinPhuong,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ThuTucHanhChinh => "thu_tuc_hanh_chinh",
            Self::ThongTinPhuong => "thong_tin_phuong",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subject within a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    /// Justice and civil status records
    TuPhapHoTich,
    /// Office hours
    LichLamViec,
    /// Leadership
    LanhDao,
    /// Individual neighbourhoods
    ThongTinKhuPho,
    /// Overview
    TongQuan,
    /// Personnel
    NhanSu,
    /// Contact details
    ThongTinLienHe,
}

impl Subject {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TuPhapHoTich => "tu_phap_ho_tich",
            Self::LichLamViec => "lich_lam_viec",
            Self::LanhDao => "lanh_dao",
            Self::ThongTinKhuPho => "thong_tin_khu_pho",
            Self::TongQuan => "tong_quan",
            Self::NhanSu => "nhan_su",
            Self::ThongTinLienHe => "thong_tin_lien_he",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyword bucket a query can be scored against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    ThuTuc,
    Lich,
    LanhDao,
    KhuPho,
    NhanSu,
    Contact,
    PhuongInfo,
}

/// First-match order used by [`classify`].
pub const PRIORITY: [Bucket; 7] = [
    Bucket::ThuTuc,
    Bucket::Lich,
    Bucket::LanhDao,
    Bucket::KhuPho,
    Bucket::NhanSu,
    Bucket::Contact,
    Bucket::PhuongInfo,
];

impl Bucket {
    /// Substring triggers for this bucket.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Self::ThuTuc => keywords::THU_TUC,
            Self::Lich => keywords::LICH_LAM_VIEC,
            Self::LanhDao => keywords::LANH_DAO,
            Self::KhuPho => keywords::KHU_PHO,
            Self::NhanSu => keywords::NHAN_SU,
            Self::Contact => keywords::CONTACT,
            Self::PhuongInfo => keywords::PHUONG_INFO,
        }
    }

    /// Label assigned when this bucket wins.
    fn label(&self, query: &str) -> Classification {
        let (category, subject) = match self {
            Self::ThuTuc => (Category::ThuTucHanhChinh, Subject::TuPhapHoTich),
            Self::Lich => (Category::ThongTinPhuong, Subject::LichLamViec),
            Self::LanhDao => (Category::ThongTinPhuong, Subject::LanhDao),
            Self::KhuPho => (Category::ThongTinPhuong, khu_pho_subject(query)),
            Self::NhanSu => (Category::ThongTinPhuong, Subject::NhanSu),
            Self::Contact => (Category::ThongTinPhuong, Subject::ThongTinLienHe),
            Self::PhuongInfo => (Category::ThongTinPhuong, Subject::TongQuan),
        };
        Classification::new(category, subject)
    }
}

/// "How many neighbourhoods" is an overview question; anything else about
/// neighbourhoods targets the per-neighbourhood documents.
fn khu_pho_subject(query: &str) -> Subject {
    if query.contains("bao nhieu") && keywords::any_match(query, keywords::DS_KHU_PHO) {
        Subject::TongQuan
    } else {
        Subject::ThongTinKhuPho
    }
}

/// Per-bucket keyword hit counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BucketScores {
    pub thu_tuc: usize,
    pub lich: usize,
    pub lanh_dao: usize,
    pub khu_pho: usize,
    pub nhan_su: usize,
    pub contact: usize,
    pub phuong_info: usize,
}

impl BucketScores {
    pub fn get(&self, bucket: Bucket) -> usize {
        match bucket {
            Bucket::ThuTuc => self.thu_tuc,
            Bucket::Lich => self.lich,
            Bucket::LanhDao => self.lanh_dao,
            Bucket::KhuPho => self.khu_pho,
            Bucket::NhanSu => self.nhan_su,
            Bucket::Contact => self.contact,
            Bucket::PhuongInfo => self.phuong_info,
        }
    }

    /// First bucket in priority order with at least one hit.
    pub fn winner(&self) -> Option<Bucket> {
        PRIORITY.into_iter().find(|b| self.get(*b) >= 1)
    }
}

/// `(category, subject)` label; both absent when nothing matched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub category: Option<Category>,
    pub subject: Option<Subject>,
}

impl Classification {
    pub fn new(category: Category, subject: Subject) -> Self {
        Self {
            category: Some(category),
            subject: Some(subject),
        }
    }

    pub fn unclassified() -> Self {
        Self::default()
    }

    pub fn is_classified(&self) -> bool {
        self.category.is_some()
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let category = self.category.map(|c| c.as_str()).unwrap_or("none");
        let subject = self.subject.map(|s| s.as_str()).unwrap_or("none");
        write!(f, "Category: {}, Subject: {}", category, subject)
    }
}

/// Count keyword hits for every bucket.
pub fn score(normalized: &str) -> BucketScores {
    BucketScores {
        thu_tuc: keywords::count_matches(normalized, keywords::THU_TUC),
        lich: keywords::count_matches(normalized, keywords::LICH_LAM_VIEC),
        lanh_dao: keywords::count_matches(normalized, keywords::LANH_DAO),
        khu_pho: keywords::count_matches(normalized, keywords::KHU_PHO),
        nhan_su: keywords::count_matches(normalized, keywords::NHAN_SU),
        contact: keywords::count_matches(normalized, keywords::CONTACT),
        phuong_info: keywords::count_matches(normalized, keywords::PHUONG_INFO),
    }
}

/// Classify an already-normalized query.
///
/// # Example
/// ```
/// use ward_knowledge::{classify, normalize_text, Category, Subject};
///
/// let label = classify(&normalize_text("Thủ tục đăng ký kết hôn"));
/// assert_eq!(label.category, Some(Category::ThuTucHanhChinh));
/// assert_eq!(label.subject, Some(Subject::TuPhapHoTich));
/// ```
pub fn classify(normalized: &str) -> Classification {
    score(normalized)
        .winner()
        .map(|bucket| bucket.label(normalized))
        .unwrap_or_default()
}

/// A raw query after normalization and classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutedQuery {
    pub normalized: String,
    pub classification: Classification,
}

/// Normalize then classify a raw user query.
pub fn route(raw: &str) -> RoutedQuery {
    let normalized = normalize_text(raw);
    let classification = classify(&normalized);
    tracing::debug!("Routed {:?} => {}", normalized, classification);
    RoutedQuery {
        normalized,
        classification,
    }
}
