//! Handler trait and utilities

use crate::extract::FromRequest;
use crate::filter::{BoxFuture, Next};
use crate::request::Request;
use crate::response::{IntoResponse, Response};
use std::future::Future;
use std::sync::Arc;

/// Trait representing an async handler function
///
/// Implemented for async functions taking up to four extractors.
pub trait Handler<T>: Clone + Send + Sync + Sized + 'static {
    /// Call the handler with the request
    fn call(self, req: Request) -> BoxFuture<Response>;
}

// 0 args
impl<F, Fut, Res> Handler<()> for F
where
    F: FnOnce() -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Res> + Send + 'static,
    Res: IntoResponse,
{
    fn call(self, _req: Request) -> BoxFuture<Response> {
        Box::pin(async move { self().await.into_response() })
    }
}

macro_rules! impl_handler {
    ($($ty:ident),+) => {
        #[allow(non_snake_case)]
        impl<F, Fut, Res, $($ty,)+> Handler<($($ty,)+)> for F
        where
            F: FnOnce($($ty,)+) -> Fut + Clone + Send + Sync + 'static,
            Fut: Future<Output = Res> + Send + 'static,
            Res: IntoResponse,
            $($ty: FromRequest + Send + 'static,)+
        {
            fn call(self, mut req: Request) -> BoxFuture<Response> {
                Box::pin(async move {
                    $(
                        let $ty = match $ty::from_request(&mut req).await {
                            Ok(v) => v,
                            Err(e) => return e.into_response(),
                        };
                    )+
                    self($($ty,)+).await.into_response()
                })
            }
        }
    };
}

impl_handler!(T1);
impl_handler!(T1, T2);
impl_handler!(T1, T2, T3);
impl_handler!(T1, T2, T3, T4);

/// Create a type-erased handler that can sit at the end of a filter chain
pub(crate) fn into_boxed_handler<H, T>(handler: H) -> Next
where
    H: Handler<T>,
    T: 'static,
{
    Arc::new(move |req| handler.clone().call(req))
}
