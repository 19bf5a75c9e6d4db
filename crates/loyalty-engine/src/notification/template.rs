//! 通知模板引擎
//!
//! 提供模板变量替换功能，支持 `{{variable}}` 语法。
//! 站内通知与邮件正文共用同一套按类型注册的模板。

use std::collections::HashMap;

use regex::Regex;
use tracing::warn;

use crate::models::NotificationType;

/// 模板渲染上下文
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    variables: HashMap<String, String>,
}

impl TemplateContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(|s| s.as_str())
    }
}

/// 模板引擎
///
/// 管理通知模板并提供变量替换功能
pub struct TemplateEngine {
    /// 标题模板（按通知类型）
    title_templates: HashMap<NotificationType, String>,
    /// 正文模板（按通知类型）
    body_templates: HashMap<NotificationType, String>,
    /// 变量匹配正则
    variable_regex: Regex,
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl TemplateEngine {
    /// 创建空的模板引擎
    pub fn new() -> Self {
        Self {
            title_templates: HashMap::new(),
            body_templates: HashMap::new(),
            // 匹配 {{variable_name}} 格式，变量名支持字母、数字、下划线
            variable_regex: Regex::new(r"\{\{(\w+)\}\}").unwrap(),
        }
    }

    /// 创建带有默认模板的引擎
    pub fn with_defaults() -> Self {
        let mut engine = Self::new();
        engine.register_default_templates();
        engine
    }

    /// 注册默认模板
    fn register_default_templates(&mut self) {
        self.register_template(
            NotificationType::PointsAdded,
            "积分到账",
            "本次消费积分 +{{points_delta}}，当前积分 {{balance_after}}。",
        );

        self.register_template(
            NotificationType::RewardEarned,
            "恭喜获得赠饮奖励！",
            "{{customer_name}}，您已累计 {{points_after}} 积分，获得一杯免费饮品，记得在有效期内使用！",
        );

        self.register_template(
            NotificationType::MilestoneReached,
            "达成消费里程碑",
            "{{customer_name}}，您已累计消费 {{milestone}} 次，感谢一路相伴！",
        );
    }

    /// 注册模板
    pub fn register_template(
        &mut self,
        notification_type: NotificationType,
        title_template: impl Into<String>,
        body_template: impl Into<String>,
    ) {
        self.title_templates
            .insert(notification_type, title_template.into());
        self.body_templates
            .insert(notification_type, body_template.into());
    }

    /// 获取模板
    pub fn get_template(&self, notification_type: &NotificationType) -> Option<(&str, &str)> {
        let title = self.title_templates.get(notification_type)?;
        let body = self.body_templates.get(notification_type)?;
        Some((title, body))
    }

    /// 渲染模板
    ///
    /// 未提供的变量保留原样并记录告警，不中断渲染
    pub fn render(&self, template: &str, context: &TemplateContext) -> String {
        self.variable_regex
            .replace_all(template, |caps: &regex::Captures<'_>| {
                let name = &caps[1];
                match context.get(name) {
                    Some(value) => value.to_string(),
                    None => {
                        warn!(variable = name, "模板变量缺失，保留占位符");
                        caps[0].to_string()
                    }
                }
            })
            .into_owned()
    }

    /// 按类型渲染标题与正文
    pub fn render_for(
        &self,
        notification_type: &NotificationType,
        context: &TemplateContext,
    ) -> Option<(String, String)> {
        let (title, body) = self.get_template(notification_type)?;
        Some((self.render(title, context), self.render(body, context)))
    }

    /// 构建 HTML 邮件正文
    pub fn render_email_html(&self, title: &str, body: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>{}</title>
    <style>
        body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #333; }}
        .container {{ max-width: 600px; margin: 0 auto; padding: 20px; }}
        .header {{ background: linear-gradient(135deg, #6f4e37 0%, #b08968 100%); color: white; padding: 20px; border-radius: 8px 8px 0 0; }}
        .content {{ background: #f9f9f9; padding: 20px; border-radius: 0 0 8px 8px; }}
        .footer {{ text-align: center; color: #888; font-size: 12px; margin-top: 20px; }}
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>{}</h1>
        </div>
        <div class="content">
            <p>{}</p>
        </div>
        <div class="footer">
            <p>此邮件由会员中心自动发送，请勿回复。</p>
        </div>
    </div>
</body>
</html>"#,
            title, title, body
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_replaces_variables() {
        let engine = TemplateEngine::new();
        let mut context = TemplateContext::new();
        context.set("customer_name", "张三").set("points_after", "10");

        let rendered = engine.render(
            "{{customer_name}}，您已累计 {{points_after}} 积分",
            &context,
        );
        assert_eq!(rendered, "张三，您已累计 10 积分");
    }

    #[test]
    fn test_render_keeps_missing_variables() {
        let engine = TemplateEngine::new();
        let context = TemplateContext::new();

        let rendered = engine.render("你好 {{unknown}}", &context);
        assert_eq!(rendered, "你好 {{unknown}}");
    }

    #[test]
    fn test_default_templates_cover_all_types() {
        let engine = TemplateEngine::with_defaults();

        for t in [
            NotificationType::PointsAdded,
            NotificationType::RewardEarned,
            NotificationType::MilestoneReached,
        ] {
            assert!(engine.get_template(&t).is_some(), "缺少模板: {:?}", t);
        }
    }

    #[test]
    fn test_render_for_reward_earned() {
        let engine = TemplateEngine::with_defaults();
        let mut context = TemplateContext::new();
        context.set("customer_name", "张三").set("points_after", "10");

        let (title, body) = engine
            .render_for(&NotificationType::RewardEarned, &context)
            .unwrap();

        assert!(title.contains("赠饮"));
        assert!(body.contains("张三"));
        assert!(body.contains("10"));
    }

    #[test]
    fn test_render_email_html_embeds_content() {
        let engine = TemplateEngine::with_defaults();
        let html = engine.render_email_html("恭喜获得赠饮奖励！", "张三，您已累计 10 积分");

        assert!(html.contains("<!DOCTYPE html>"));
        assert!(html.contains("恭喜获得赠饮奖励！"));
        assert!(html.contains("张三，您已累计 10 积分"));
        assert!(html.contains("会员中心"));
    }
}
