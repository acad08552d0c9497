//! Keyword sets used by the classifier.
//!
//! Every trigger is written in normalized form (see [`crate::normalize_text`])
//! and matched as a plain substring of the normalized query.

/// Administrative procedures: registrations, civil status records, fees.
pub const THU_TUC: &[&str] = &[
    "thu tuc",
    "dang ky",
    "ho so",
    "nop o dau",
    "bao lau",
    "cap giay",
    "khai sinh",
    "khai tu",
    "ket hon",
    "chung thuc",
    "lam the nao",
    "can gi",
    "nop truc tuyen",
    "truc tuyen",
    "giay to",
    "le phi",
];

/// General facts about the ward; the fallback bucket.
pub const PHUONG_INFO: &[&str] = &[
    "vi tri",
    "dia ly",
    "dia chi",
    "dien tich",
    "dan so",
    "dan cu",
    "dong dan",
    "ho dan",
    "bao nhieu nguoi",
    "lanh dao",
    "so dien thoai",
    "khu pho",
    "gio lam viec",
    "lich lam viec",
    "website",
    "email",
    "duong day nong",
    "nam o dau",
    "lien he",
    "thanh lap",
    "nam nao",
    "xa ba diem",
];

/// Staff and officials below the elected leadership.
pub const NHAN_SU: &[&str] = &[
    "giam doc",
    "phu trach",
    "cong chuc",
    "nhan vien",
    "lanh dao",
];

/// Party, people's committee and council leadership titles.
pub const LANH_DAO: &[&str] = &[
    "bi thu phuong",
    "bi thu",
    "pho bi thu",
    "bi thu dang uy",
    "chu tich phuong",
    "chu tich",
    "pho chu tich",
    "pho chu tich phuong",
    "bi thu doan phuong",
    "bi thu doan",
    "pho bi thu phuong",
    "chu tich ubnd phuong",
    "chu tich ubnd",
    "pho chu tich ubnd phuong",
    "pho chu tich ubnd",
    "chu tich hdnd phuong",
    "chu tich hdnd",
    "pho chu tich hdnd phuong",
    "pho chu tich hdnd",
];

/// Neighbourhoods (khu pho) of the ward.
pub const KHU_PHO: &[&str] = &["khu pho", "kp"];

/// Count/list wording that turns a neighbourhood question into an overview.
pub const DS_KHU_PHO: &[&str] = &["danh sach", "so luong", "bao nhieu"];

/// Contact channels.
pub const CONTACT: &[&str] = &[
    "duong day nong",
    "thong tin lien he",
    "lien he",
    "website",
    "email",
    "fanpage",
    "so dien thoai",
    "dia chi",
    "goi dien",
    "zalo",
];

/// Office hours and working days.
pub const LICH_LAM_VIEC: &[&str] = &[
    "lam viec tu",
    "lich lam viec",
    "gio lam viec",
    "buoi sang",
    "chu nhat",
    "thu 2",
    "thu hai",
    "thu 3",
    "thu ba",
    "thu 4",
    "thu nam",
    "thu 5",
    "thu sau",
    "thu 6",
    "thu 7",
    "t2",
    "t3",
    "t4",
    "t5",
    "t6",
    "t7",
    "cn",
    "thu bay",
    "ngay le",
    "nghi le",
    "lam viec may gio",
    "may gio",
];

/// Number of triggers from `keywords` contained in `query`.
pub fn count_matches(query: &str, keywords: &[&str]) -> usize {
    keywords.iter().filter(|kw| query.contains(*kw)).count()
}

/// Whether any trigger from `keywords` is contained in `query`.
pub fn any_match(query: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| query.contains(kw))
}
