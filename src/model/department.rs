use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Department {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "Engineering")]
    pub name: String,
    #[schema(example = "Product engineering", nullable = true)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateDepartment {
    #[schema(example = "Engineering")]
    pub name: String,
    #[schema(example = "Product engineering")]
    pub description: Option<String>,
}

impl CreateDepartment {
    pub fn normalize(self) -> Result<CreateDepartment, AppError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::MissingField("name"));
        }
        Ok(CreateDepartment {
            name,
            description: self
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_trims() {
        let dept = CreateDepartment {
            name: "  Finance ".into(),
            description: Some(" ".into()),
        }
        .normalize()
        .unwrap();
        assert_eq!(dept.name, "Finance");
        assert_eq!(dept.description, None);
    }

    #[test]
    fn test_blank_name_is_missing() {
        let err = CreateDepartment {
            name: "\t".into(),
            description: None,
        }
        .normalize()
        .unwrap_err();
        assert!(matches!(err, AppError::MissingField("name")));
    }
}
