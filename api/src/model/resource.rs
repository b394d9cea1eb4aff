use derive_new::new;
use garde::Validate;
use kernel::model::{
    id::{ResourceId, UserId},
    resource::{
        event::{CreateResource, UpdateResource},
        Resource, ResourceCategory,
    },
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryName {
    Pool,
    Gym,
    Hall,
    Garden,
    GuestParking,
    Other,
}

impl From<ResourceCategory> for CategoryName {
    fn from(value: ResourceCategory) -> Self {
        match value {
            ResourceCategory::Pool => Self::Pool,
            ResourceCategory::Gym => Self::Gym,
            ResourceCategory::Hall => Self::Hall,
            ResourceCategory::Garden => Self::Garden,
            ResourceCategory::GuestParking => Self::GuestParking,
            ResourceCategory::Other => Self::Other,
        }
    }
}

impl From<CategoryName> for ResourceCategory {
    fn from(value: CategoryName) -> Self {
        match value {
            CategoryName::Pool => Self::Pool,
            CategoryName::Gym => Self::Gym,
            CategoryName::Hall => Self::Hall,
            CategoryName::Garden => Self::Garden,
            CategoryName::GuestParking => Self::GuestParking,
            CategoryName::Other => Self::Other,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateResourceRequest {
    #[garde(length(min = 1))]
    pub resource_name: String,
    #[garde(skip)]
    pub category: CategoryName,
    #[garde(skip)]
    pub description: String,
    #[garde(range(min = 1))]
    pub capacity: i32,
    #[garde(skip)]
    pub per_user_daily_limit: bool,
    #[garde(skip)]
    pub is_active: bool,
}

impl From<CreateResourceRequest> for CreateResource {
    fn from(value: CreateResourceRequest) -> Self {
        let CreateResourceRequest {
            resource_name,
            category,
            description,
            capacity,
            per_user_daily_limit,
            is_active,
        } = value;
        CreateResource {
            resource_name,
            category: category.into(),
            description,
            capacity,
            per_user_daily_limit,
            is_active,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResourceRequest {
    #[garde(inner(length(min = 1)))]
    pub resource_name: Option<String>,
    #[garde(skip)]
    pub category: Option<CategoryName>,
    #[garde(skip)]
    pub description: Option<String>,
    #[garde(inner(range(min = 1)))]
    pub capacity: Option<i32>,
    #[garde(skip)]
    pub per_user_daily_limit: Option<bool>,
    #[garde(skip)]
    pub is_active: Option<bool>,
}

#[derive(new)]
pub struct UpdateResourceRequestWithIds(ResourceId, UserId, UpdateResourceRequest);

impl From<UpdateResourceRequestWithIds> for UpdateResource {
    fn from(value: UpdateResourceRequestWithIds) -> Self {
        let UpdateResourceRequestWithIds(
            resource_id,
            requested_user,
            UpdateResourceRequest {
                resource_name,
                category,
                description,
                capacity,
                per_user_daily_limit,
                is_active,
            },
        ) = value;
        UpdateResource {
            resource_id,
            resource_name,
            category: category.map(ResourceCategory::from),
            description,
            capacity,
            per_user_daily_limit,
            is_active,
            requested_user,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourcesResponse {
    pub items: Vec<ResourceResponse>,
}

impl From<Vec<Resource>> for ResourcesResponse {
    fn from(value: Vec<Resource>) -> Self {
        Self {
            items: value.into_iter().map(ResourceResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceResponse {
    pub resource_id: ResourceId,
    pub resource_name: String,
    pub category: CategoryName,
    pub description: String,
    pub capacity: i32,
    pub per_user_daily_limit: bool,
    pub is_active: bool,
}

impl From<Resource> for ResourceResponse {
    fn from(value: Resource) -> Self {
        let Resource {
            resource_id,
            resource_name,
            category,
            description,
            capacity,
            per_user_daily_limit,
            is_active,
        } = value;
        Self {
            resource_id,
            resource_name,
            category: category.into(),
            description,
            capacity,
            per_user_daily_limit,
            is_active,
        }
    }
}
