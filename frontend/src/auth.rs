//! 认证模块
//!
//! 持有后端门面与会话存储，并把会话状态镜像到一个响应式信号。
//! 路由服务通过注入的状态信号做守卫判断。

use crate::web::{BrowserStorage, FetchHttpClient};
use clubhub::backend::{Registration, RowScope, SignUpOutcome};
use clubhub::config::{BackendConfig, ENV_ANON_KEY, ENV_ROW_SCOPE, ENV_SERVICE_URL, EnvAdapter};
use clubhub::{Backend, ClubResult, Facade, SessionStatus, SessionStore};
use clubhub_shared::Session;
use leptos::prelude::*;
use leptos::task::spawn_local;
use std::rc::Rc;
use uuid::Uuid;

pub type ClientFacade = Facade<FetchHttpClient, BrowserStorage>;

/// 构建时注入的配置
struct BuildEnv;

impl EnvAdapter for BuildEnv {
    fn var(&self, name: &str) -> Option<String> {
        let value = match name {
            ENV_SERVICE_URL => option_env!("CLUBHUB_SUPABASE_URL"),
            ENV_ANON_KEY => option_env!("CLUBHUB_SUPABASE_ANON_KEY"),
            ENV_ROW_SCOPE => option_env!("CLUBHUB_ROW_SCOPE"),
            _ => None,
        };
        value.map(str::to_string)
    }
}

/// 应用上下文
///
/// 所有字段都是 `Copy` 句柄，可以直接放进闭包。
#[derive(Clone, Copy)]
pub struct AppContext {
    backend: StoredValue<Rc<ClientFacade>, LocalStorage>,
    /// 会话状态（只读）
    pub status: ReadSignal<SessionStatus>,
}

impl AppContext {
    /// 创建门面与会话存储，并开始恢复会话
    pub fn new() -> Self {
        let facade = Rc::new(Facade::new(
            BackendConfig::from_env(&BuildEnv),
            FetchHttpClient,
            BrowserStorage,
        ));

        let (status, set_status) = signal(SessionStatus::Loading);
        let store = SessionStore::attach(facade.as_ref());
        let watch = store.watch(move |s: &SessionStatus| set_status.set(s.clone()));
        let store = Rc::new(store);

        spawn_local({
            let facade = facade.clone();
            let store = store.clone();
            async move { store.restore(facade.as_ref()).await }
        });

        // Owner 销毁时一并释放两个订阅
        let _subscriptions = StoredValue::new_local((store, watch));

        Self {
            backend: StoredValue::new_local(facade),
            status,
        }
    }

    pub fn backend(&self) -> Rc<ClientFacade> {
        self.backend.get_value()
    }

    /// 缺少配置时的提示信息
    pub fn configuration_error(&self) -> Option<String> {
        self.backend
            .with_value(|b| b.configuration_error().map(str::to_string))
    }

    pub fn session(&self) -> Option<Session> {
        self.status.with_untracked(|s| s.session().cloned())
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.session().map(|s| s.user_id())
    }

    /// 当前用户可见的行范围
    pub fn scope(&self) -> RowScope {
        let mode = self.backend.with_value(|b| b.scope_mode());
        self.session()
            .map(|s| RowScope::for_session(mode, &s))
            .unwrap_or_default()
    }
}

/// 从 Context 获取应用上下文
pub fn use_app() -> AppContext {
    use_context::<AppContext>().expect("AppContext should be provided")
}

/// 登录；成功后路由服务会随会话状态自动跳转
pub async fn sign_in(ctx: AppContext, email: String, password: String) -> ClubResult<()> {
    ctx.backend().sign_in(&email, &password).await.map(|_| ())
}

pub async fn sign_up(ctx: AppContext, registration: Registration) -> ClubResult<SignUpOutcome> {
    ctx.backend().sign_up(&registration).await
}

/// 注销并清除状态
///
/// 导航由路由守卫根据会话状态自动处理。
pub fn sign_out(ctx: AppContext) {
    let backend = ctx.backend();
    spawn_local(async move {
        if let Err(e) = backend.sign_out().await {
            log::warn!("sign-out failed: {e}");
        }
    });
}
