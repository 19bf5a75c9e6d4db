//! 服务层 DTO 定义

use serde::Deserialize;
use validator::Validate;

/// 注册会员请求
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterCustomerRequest {
    /// 会员 ID，不传时由系统生成
    pub id: Option<String>,
    #[validate(length(min = 1, max = 64, message = "姓名长度必须在1-64个字符之间"))]
    pub name: String,
    #[validate(length(min = 5, max = 32, message = "手机号长度必须在5-32个字符之间"))]
    pub phone: String,
    #[validate(email(message = "邮箱格式无效"))]
    pub email: Option<String>,
}

/// 积分扣减请求
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RedeemPointsRequest {
    #[validate(range(min = 1, message = "扣减积分必须大于0"))]
    pub points: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_validation() {
        let valid = RegisterCustomerRequest {
            id: None,
            name: "张三".to_string(),
            phone: "13800000000".to_string(),
            email: Some("zhang@example.com".to_string()),
        };
        assert!(valid.validate().is_ok());

        let empty_name = RegisterCustomerRequest {
            id: None,
            name: String::new(),
            phone: "13800000000".to_string(),
            email: None,
        };
        assert!(empty_name.validate().is_err());

        let bad_email = RegisterCustomerRequest {
            id: None,
            name: "张三".to_string(),
            phone: "13800000000".to_string(),
            email: Some("not-an-email".to_string()),
        };
        assert!(bad_email.validate().is_err());
    }

    #[test]
    fn test_redeem_points_request_validation() {
        assert!(RedeemPointsRequest { points: 10 }.validate().is_ok());
        assert!(RedeemPointsRequest { points: 0 }.validate().is_err());
        assert!(RedeemPointsRequest { points: -1 }.validate().is_err());
    }
}
