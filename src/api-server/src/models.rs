use rota_authz::{
    AccessDecision, DepartmentId, PropertyId, ResolvedScope, RoleAssignment, UserContext,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// One role assignment as sent by the caller
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentDto {
    /// Role name, used to recognise manager roles
    #[serde(default)]
    pub role: Option<String>,

    /// Property the assignment is scoped to; null means unscoped
    #[serde(default)]
    pub property_id: Option<String>,

    /// Department the assignment is scoped to; null means unscoped
    #[serde(default)]
    pub department_id: Option<String>,
}

/// Authenticated user's context, forwarded by the calling route
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserContextDto {
    #[validate(length(min = 1, max = 255))]
    pub user_id: String,

    #[serde(default)]
    pub assignments: Vec<AssignmentDto>,
}

impl TryFrom<UserContextDto> for UserContext {
    type Error = rota_authz::AuthzError;

    fn try_from(dto: UserContextDto) -> Result<Self, Self::Error> {
        let mut user = UserContext::new(&dto.user_id)?;
        for assignment in dto.assignments {
            user = user.with_assignment(RoleAssignment {
                role: assignment.role,
                property_id: assignment.property_id.map(PropertyId::parse).transpose()?,
                department_id: assignment.department_id.map(DepartmentId::parse).transpose()?,
            });
        }
        Ok(user)
    }
}

/// Accessible departments request
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentsRequest {
    #[validate(nested)]
    pub user: UserContextDto,

    #[validate(length(min = 1, max = 255))]
    pub property_id: String,
}

/// Department access check request
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentCheckRequest {
    #[validate(nested)]
    pub user: UserContextDto,

    #[validate(length(min = 1, max = 255))]
    pub property_id: String,

    #[validate(length(min = 1, max = 255))]
    pub department_id: String,
}

/// Employee access check request
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeCheckRequest {
    #[validate(nested)]
    pub user: UserContextDto,

    #[validate(length(min = 1, max = 255))]
    pub property_id: String,

    #[validate(length(min = 1, max = 255))]
    pub employee_id: String,
}

/// Resolved scope within a property
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentsResponse {
    pub property_id: String,

    /// Whether the user covers the whole property
    pub property_wide: bool,

    /// Accessible department ids, sorted and deduplicated
    pub departments: Vec<String>,

    /// Decision latency in milliseconds
    pub latency_ms: u64,
}

impl DepartmentsResponse {
    pub fn new(scope: ResolvedScope, latency_ms: u64) -> Self {
        Self {
            property_id: scope.property_id.into(),
            property_wide: scope.property_wide,
            departments: scope.departments.into_iter().map(String::from).collect(),
            latency_ms,
        }
    }
}

/// Access check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccessCheckResponse {
    /// Whether the action is allowed
    pub allowed: bool,

    /// Machine-readable reason code
    pub reason_code: String,

    /// Reason for the decision
    pub reason: String,

    /// Decision latency in milliseconds
    pub latency_ms: u64,
}

impl AccessCheckResponse {
    pub fn new(decision: AccessDecision, latency_ms: u64) -> Self {
        Self {
            allowed: decision.allowed,
            reason_code: decision.reason.code().to_string(),
            reason: decision.reason.to_string(),
            latency_ms,
        }
    }
}

/// Error body
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub status: u16,

    /// True when the directory failed and no decision was made
    pub indeterminate: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_context_conversion() {
        let dto: UserContextDto = serde_json::from_value(serde_json::json!({
            "userId": "u-1",
            "assignments": [
                {"propertyId": "P1", "departmentId": "D1"},
                {"role": "property_manager", "propertyId": "P2"}
            ]
        }))
        .unwrap();

        let user = UserContext::try_from(dto).unwrap();
        assert_eq!(user.assignments.len(), 2);
        assert!(user.assignments[1].department_id.is_none());
        assert!(user.assignments[1].has_role("property_manager"));
    }

    #[test]
    fn test_blank_assignment_ids_rejected() {
        let dto = UserContextDto {
            user_id: "u-1".into(),
            assignments: vec![AssignmentDto {
                property_id: Some("  ".into()),
                ..Default::default()
            }],
        };

        let err = UserContext::try_from(dto).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_request_validation() {
        let req = DepartmentsRequest {
            user: UserContextDto {
                user_id: "u-1".into(),
                assignments: vec![],
            },
            property_id: String::new(),
        };
        assert!(req.validate().is_err());

        let req = DepartmentsRequest {
            user: UserContextDto {
                user_id: String::new(),
                assignments: vec![],
            },
            property_id: "P1".into(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_user_context_json_matches_library() {
        let json = serde_json::json!({
            "userId": "u-1",
            "assignments": [{"role": "scheduler", "propertyId": "P1", "departmentId": null}]
        });

        let dto: UserContextDto = serde_json::from_value(json.clone()).unwrap();
        let direct: UserContext = serde_json::from_value(json).unwrap();
        assert_eq!(UserContext::try_from(dto).unwrap(), direct);

        // snake_case keys are not part of the wire format
        let snake = serde_json::json!({"user_id": "u-1", "assignments": []});
        assert!(serde_json::from_value::<UserContextDto>(snake).is_err());
    }

    #[test]
    fn test_responses_serialize_camel_case() {
        let response = AccessCheckResponse {
            allowed: false,
            reason_code: "not_in_scope".into(),
            reason: "not in scope".into(),
            latency_ms: 3,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["reasonCode"], "not_in_scope");
        assert_eq!(json["latencyMs"], 3);
        assert!(json.get("reason_code").is_none());
    }
}
