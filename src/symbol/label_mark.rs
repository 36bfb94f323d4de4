//! シンボルごとのラベルマーク管理

use indexmap::IndexSet;

use super::label::{Label, LabelCategory, Lifecycle, ObjectOriented, Permission, Restriction};

/// シンボルに現在付いているラベルをカテゴリ別に記録する
///
/// Permissionは単一値で、その他のカテゴリは集合です。すべての問い合わせはO(1)です。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelMarkManager {
    permission: Option<Permission>,
    lifecycle: Lifecycle,
    restriction: Restriction,
    object_oriented: ObjectOriented,
    type_labels: IndexSet<String>,
}

impl LabelMarkManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// ラベル列からマーク状態を作る。Permissionは最初のものが優先される
    pub fn from_labels<'a>(labels: impl IntoIterator<Item = &'a Label>) -> Self {
        let mut marks = Self::new();
        for label in labels {
            marks.mark_label(label, false);
        }
        marks
    }

    /// ラベルをマークする
    ///
    /// Permissionは既にマークされている場合、`refresh` がtrueのときだけ置き換える。
    pub fn mark_label(&mut self, label: &Label, refresh: bool) {
        match label {
            Label::Permission(permission) => {
                if self.permission.is_none() || refresh {
                    self.permission = Some(*permission);
                }
            }
            Label::Lifecycle(flags) => self.lifecycle.insert(*flags),
            Label::Restriction(flags) => self.restriction.insert(*flags),
            Label::ObjectOriented(flags) => self.object_oriented.insert(*flags),
            Label::Type(name) => {
                self.type_labels.insert(name.clone());
            }
        }
    }

    /// 1つのラベルのマークを取り消す
    pub fn cancel_label(&mut self, label: &Label) {
        match label {
            Label::Permission(permission) => {
                if self.permission == Some(*permission) {
                    self.permission = None;
                }
            }
            Label::Lifecycle(flags) => self.lifecycle.remove(*flags),
            Label::Restriction(flags) => self.restriction.remove(*flags),
            Label::ObjectOriented(flags) => self.object_oriented.remove(*flags),
            Label::Type(name) => {
                self.type_labels.shift_remove(name);
            }
        }
    }

    /// カテゴリ内のマークをすべて消す
    pub fn reset(&mut self, category: LabelCategory) {
        match category {
            LabelCategory::Permission => self.permission = None,
            LabelCategory::Lifecycle => self.lifecycle = Lifecycle::empty(),
            LabelCategory::Restriction => self.restriction = Restriction::empty(),
            LabelCategory::ObjectOriented => self.object_oriented = ObjectOriented::empty(),
            LabelCategory::Type => self.type_labels.clear(),
        }
    }

    pub fn reset_all(&mut self) {
        *self = Self::default();
    }

    pub fn is_marked(&self, label: &Label) -> bool {
        match label {
            Label::Permission(permission) => self.permission == Some(*permission),
            Label::Lifecycle(flags) => self.lifecycle.contains(*flags),
            Label::Restriction(flags) => self.restriction.contains(*flags),
            Label::ObjectOriented(flags) => self.object_oriented.contains(*flags),
            Label::Type(name) => self.type_labels.contains(name),
        }
    }

    pub fn is_category_marked(&self, category: LabelCategory) -> bool {
        match category {
            LabelCategory::Permission => self.permission.is_some(),
            LabelCategory::Lifecycle => !self.lifecycle.is_empty(),
            LabelCategory::Restriction => !self.restriction.is_empty(),
            LabelCategory::ObjectOriented => !self.object_oriented.is_empty(),
            LabelCategory::Type => !self.type_labels.is_empty(),
        }
    }

    pub fn permission(&self) -> Option<Permission> {
        self.permission
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn restriction(&self) -> Restriction {
        self.restriction
    }

    pub fn object_oriented(&self) -> ObjectOriented {
        self.object_oriented
    }

    /// ジェネリック制約として付いた型ラベル名（付与順）
    pub fn type_labels(&self) -> impl Iterator<Item = &str> {
        self.type_labels.iter().map(String::as_str)
    }

    pub fn is_static_marked(&self) -> bool {
        self.lifecycle.contains(Lifecycle::STATIC)
    }

    pub fn is_const_marked(&self) -> bool {
        self.restriction.contains(Restriction::CONST)
    }

    pub fn is_iterable_marked(&self) -> bool {
        self.object_oriented.contains(ObjectOriented::ITERABLE)
    }

    /// マークされているラベルを列挙する
    pub fn labels(&self) -> Vec<Label> {
        let mut labels = Vec::new();
        if let Some(permission) = self.permission {
            labels.push(Label::Permission(permission));
        }
        labels.extend(self.lifecycle.iter().map(Label::Lifecycle));
        labels.extend(self.restriction.iter().map(Label::Restriction));
        labels.extend(self.object_oriented.iter().map(Label::ObjectOriented));
        labels.extend(self.type_labels.iter().cloned().map(Label::Type));
        labels
    }
}
