//! Static reference lists offered to clients for building search filters.

/// Placeholder meaning "no constraint" in filter lists.
pub const UNSPECIFIED: &str = "指定なし";

pub const DEPARTMENTS: &[&str] = &[
    UNSPECIFIED,
    "青山スタンダード科目",
    "文学部共通",
    "文学部外国語科目",
    "英米文学科",
    "フランス文学科",
    "比較芸術学科",
    "教育人間　外国語科目",
    "教育人間　教育学科",
    "教育人間　心理学科",
    "経済学部",
    "法学部",
    "経営学部",
    "教職課程科目",
    "国際政治経済学部",
    "総合文化政策学部",
    "日本文学科",
    "史学科",
    "理工学部共通",
    "物理科学",
    "数理サイエンス",
    "物理・数理",
    "電気電子工学科",
    "機械創造",
    "経営システム",
    "情報テクノロジ－",
    "社会情報学部",
    "地球社会共生学部",
    "コミュニティ人間科学部",
    "化学・生命",
];

pub const SEMESTERS: &[&str] = &[
    UNSPECIFIED,
    "前期",
    "通年",
    "後期",
    "後期前半",
    "後期後半",
    "通年隔１",
    "前期前半",
    "前期後半",
    "通年隔２",
    "前期集中",
    "夏休集中",
    "集中",
    "春休集中",
    "後期集中",
    "前期隔２",
    "前期隔１",
    "後期隔２",
    "後期隔１",
    "通年集中",
];
