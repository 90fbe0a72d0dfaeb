//! HTTP 请求封装模块
//!
//! 基于 `gloo-net` 的 fetch 实现 [`HttpClient`]，供浏览器端的后端门面使用。

use async_trait::async_trait;
use clubhub::error::{ClubError, ClubResult};
use clubhub::request::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use gloo_net::http::Request;

/// 浏览器 fetch 客户端
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchHttpClient;

#[async_trait(?Send)]
impl HttpClient for FetchHttpClient {
    async fn send(&self, req: HttpRequest) -> ClubResult<HttpResponse> {
        let mut builder = match req.method {
            HttpMethod::Get => Request::get(&req.url),
            HttpMethod::Post => Request::post(&req.url),
            HttpMethod::Delete => Request::delete(&req.url),
        };
        for (key, value) in &req.headers {
            builder = builder.header(key, value);
        }

        let request = match req.body {
            Some(body) => builder.body(body),
            None => builder.build(),
        }
        .map_err(|e| ClubError::network(format!("请求构建失败: {e}")).with_source(e))?;

        let resp = request
            .send()
            .await
            .map_err(|e| ClubError::network(format!("网络错误: {e}")).with_source(e))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| ClubError::network(format!("响应读取失败: {e}")).with_source(e))?;

        Ok(HttpResponse { status, body })
    }
}
