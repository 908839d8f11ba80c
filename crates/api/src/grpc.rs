//! Unary gRPC client and server glue for the four auction services.
//!
//! Kept in the shape of prost/tonic codegen output so that the method paths
//! and codec wiring stay obvious; there is exactly one unary method per
//! service and no streaming.

/// Client and server for the seller front end's `SelectAd`.
pub mod seller_front_end {
    use tonic::codegen::*;

    #[async_trait]
    pub trait SellerFrontEnd: Send + Sync + 'static {
        /// Runs one protected auction and returns the encrypted result.
        async fn select_ad(
            &self,
            request: tonic::Request<super::super::SelectAdRequest>,
        ) -> std::result::Result<tonic::Response<super::super::SelectAdResponse>, tonic::Status>;
    }

    #[derive(Debug)]
    pub struct SellerFrontEndServer<T> {
        inner: Arc<T>,
    }

    impl<T> SellerFrontEndServer<T> {
        pub fn new(inner: T) -> Self {
            Self { inner: Arc::new(inner) }
        }
    }

    impl<T> Clone for SellerFrontEndServer<T> {
        fn clone(&self) -> Self {
            Self { inner: Arc::clone(&self.inner) }
        }
    }

    impl<T, B> tonic::codegen::Service<http::Request<B>> for SellerFrontEndServer<T>
    where
        T: SellerFrontEnd,
        B: Body + Send + 'static,
        B::Error: Into<StdError> + Send + 'static,
    {
        type Response = http::Response<tonic::body::BoxBody>;
        type Error = std::convert::Infallible;
        type Future = BoxFuture<Self::Response, Self::Error>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: http::Request<B>) -> Self::Future {
            match req.uri().path() {
                "/ba.SellerFrontEnd/SelectAd" => {
                    struct SelectAdSvc<T>(Arc<T>);
                    impl<T: SellerFrontEnd> tonic::server::UnaryService<super::super::SelectAdRequest>
                        for SelectAdSvc<T>
                    {
                        type Response = super::super::SelectAdResponse;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::super::SelectAdRequest>,
                        ) -> Self::Future {
                            let inner = Arc::clone(&self.0);
                            Box::pin(async move { inner.select_ad(request).await })
                        }
                    }
                    let inner = Arc::clone(&self.inner);
                    Box::pin(async move {
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = tonic::server::Grpc::new(codec);
                        Ok(grpc.unary(SelectAdSvc(inner), req).await)
                    })
                }
                _ => Box::pin(async move {
                    Ok(http::Response::builder()
                        .status(200)
                        .header("grpc-status", "12")
                        .header("content-type", "application/grpc")
                        .body(empty_body())
                        .unwrap())
                }),
            }
        }
    }

    impl<T: SellerFrontEnd> tonic::server::NamedService for SellerFrontEndServer<T> {
        const NAME: &'static str = "ba.SellerFrontEnd";
    }

    #[derive(Debug, Clone)]
    pub struct SellerFrontEndClient<T> {
        inner: tonic::client::Grpc<T>,
    }

    impl SellerFrontEndClient<tonic::transport::Channel> {
        pub async fn connect<D>(dst: D) -> std::result::Result<Self, tonic::transport::Error>
        where
            D: TryInto<tonic::transport::Endpoint>,
            D::Error: Into<StdError>,
        {
            let conn = tonic::transport::Endpoint::new(dst)?.connect().await?;
            Ok(Self::new(conn))
        }
    }

    impl<T> SellerFrontEndClient<T>
    where
        T: tonic::client::GrpcService<tonic::body::BoxBody>,
        T::Error: Into<StdError>,
        T::ResponseBody: Body<Data = Bytes> + Send + 'static,
        <T::ResponseBody as Body>::Error: Into<StdError> + Send,
    {
        pub fn new(inner: T) -> Self {
            Self { inner: tonic::client::Grpc::new(inner) }
        }

        pub async fn select_ad(
            &mut self,
            request: impl tonic::IntoRequest<super::super::SelectAdRequest>,
        ) -> std::result::Result<tonic::Response<super::super::SelectAdResponse>, tonic::Status>
        {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/ba.SellerFrontEnd/SelectAd");
            let mut req = request.into_request();
            req.extensions_mut()
                .insert(GrpcMethod::new("ba.SellerFrontEnd", "SelectAd"));
            self.inner.unary(req, path, codec).await
        }
    }
}

/// Client and server for the buyer front end's `GetBids`.
pub mod buyer_front_end {
    use tonic::codegen::*;

    #[async_trait]
    pub trait BuyerFrontEnd: Send + Sync + 'static {
        /// Generates this buyer's bids for one auction.
        async fn get_bids(
            &self,
            request: tonic::Request<super::super::GetBidsRequest>,
        ) -> std::result::Result<tonic::Response<super::super::GetBidsResponse>, tonic::Status>;
    }

    #[derive(Debug)]
    pub struct BuyerFrontEndServer<T> {
        inner: Arc<T>,
    }

    impl<T> BuyerFrontEndServer<T> {
        pub fn new(inner: T) -> Self {
            Self { inner: Arc::new(inner) }
        }
    }

    impl<T> Clone for BuyerFrontEndServer<T> {
        fn clone(&self) -> Self {
            Self { inner: Arc::clone(&self.inner) }
        }
    }

    impl<T, B> tonic::codegen::Service<http::Request<B>> for BuyerFrontEndServer<T>
    where
        T: BuyerFrontEnd,
        B: Body + Send + 'static,
        B::Error: Into<StdError> + Send + 'static,
    {
        type Response = http::Response<tonic::body::BoxBody>;
        type Error = std::convert::Infallible;
        type Future = BoxFuture<Self::Response, Self::Error>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: http::Request<B>) -> Self::Future {
            match req.uri().path() {
                "/ba.BuyerFrontEnd/GetBids" => {
                    struct GetBidsSvc<T>(Arc<T>);
                    impl<T: BuyerFrontEnd> tonic::server::UnaryService<super::super::GetBidsRequest>
                        for GetBidsSvc<T>
                    {
                        type Response = super::super::GetBidsResponse;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::super::GetBidsRequest>,
                        ) -> Self::Future {
                            let inner = Arc::clone(&self.0);
                            Box::pin(async move { inner.get_bids(request).await })
                        }
                    }
                    let inner = Arc::clone(&self.inner);
                    Box::pin(async move {
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = tonic::server::Grpc::new(codec);
                        Ok(grpc.unary(GetBidsSvc(inner), req).await)
                    })
                }
                _ => Box::pin(async move {
                    Ok(http::Response::builder()
                        .status(200)
                        .header("grpc-status", "12")
                        .header("content-type", "application/grpc")
                        .body(empty_body())
                        .unwrap())
                }),
            }
        }
    }

    impl<T: BuyerFrontEnd> tonic::server::NamedService for BuyerFrontEndServer<T> {
        const NAME: &'static str = "ba.BuyerFrontEnd";
    }

    #[derive(Debug, Clone)]
    pub struct BuyerFrontEndClient<T> {
        inner: tonic::client::Grpc<T>,
    }

    impl BuyerFrontEndClient<tonic::transport::Channel> {
        pub async fn connect<D>(dst: D) -> std::result::Result<Self, tonic::transport::Error>
        where
            D: TryInto<tonic::transport::Endpoint>,
            D::Error: Into<StdError>,
        {
            let conn = tonic::transport::Endpoint::new(dst)?.connect().await?;
            Ok(Self::new(conn))
        }
    }

    impl<T> BuyerFrontEndClient<T>
    where
        T: tonic::client::GrpcService<tonic::body::BoxBody>,
        T::Error: Into<StdError>,
        T::ResponseBody: Body<Data = Bytes> + Send + 'static,
        <T::ResponseBody as Body>::Error: Into<StdError> + Send,
    {
        pub fn new(inner: T) -> Self {
            Self { inner: tonic::client::Grpc::new(inner) }
        }

        pub async fn get_bids(
            &mut self,
            request: impl tonic::IntoRequest<super::super::GetBidsRequest>,
        ) -> std::result::Result<tonic::Response<super::super::GetBidsResponse>, tonic::Status>
        {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/ba.BuyerFrontEnd/GetBids");
            let mut req = request.into_request();
            req.extensions_mut()
                .insert(GrpcMethod::new("ba.BuyerFrontEnd", "GetBids"));
            self.inner.unary(req, path, codec).await
        }
    }
}

/// Client and server for the bidding service's `GenerateBids`.
pub mod bidding {
    use tonic::codegen::*;

    #[async_trait]
    pub trait Bidding: Send + Sync + 'static {
        /// Executes `generateBid` for every interest group in the request.
        async fn generate_bids(
            &self,
            request: tonic::Request<super::super::GenerateBidsRequest>,
        ) -> std::result::Result<tonic::Response<super::super::GenerateBidsResponse>, tonic::Status>;
    }

    #[derive(Debug)]
    pub struct BiddingServer<T> {
        inner: Arc<T>,
    }

    impl<T> BiddingServer<T> {
        pub fn new(inner: T) -> Self {
            Self { inner: Arc::new(inner) }
        }
    }

    impl<T> Clone for BiddingServer<T> {
        fn clone(&self) -> Self {
            Self { inner: Arc::clone(&self.inner) }
        }
    }

    impl<T, B> tonic::codegen::Service<http::Request<B>> for BiddingServer<T>
    where
        T: Bidding,
        B: Body + Send + 'static,
        B::Error: Into<StdError> + Send + 'static,
    {
        type Response = http::Response<tonic::body::BoxBody>;
        type Error = std::convert::Infallible;
        type Future = BoxFuture<Self::Response, Self::Error>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: http::Request<B>) -> Self::Future {
            match req.uri().path() {
                "/ba.Bidding/GenerateBids" => {
                    struct GenerateBidsSvc<T>(Arc<T>);
                    impl<T: Bidding> tonic::server::UnaryService<super::super::GenerateBidsRequest>
                        for GenerateBidsSvc<T>
                    {
                        type Response = super::super::GenerateBidsResponse;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::super::GenerateBidsRequest>,
                        ) -> Self::Future {
                            let inner = Arc::clone(&self.0);
                            Box::pin(async move { inner.generate_bids(request).await })
                        }
                    }
                    let inner = Arc::clone(&self.inner);
                    Box::pin(async move {
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = tonic::server::Grpc::new(codec);
                        Ok(grpc.unary(GenerateBidsSvc(inner), req).await)
                    })
                }
                _ => Box::pin(async move {
                    Ok(http::Response::builder()
                        .status(200)
                        .header("grpc-status", "12")
                        .header("content-type", "application/grpc")
                        .body(empty_body())
                        .unwrap())
                }),
            }
        }
    }

    impl<T: Bidding> tonic::server::NamedService for BiddingServer<T> {
        const NAME: &'static str = "ba.Bidding";
    }

    #[derive(Debug, Clone)]
    pub struct BiddingClient<T> {
        inner: tonic::client::Grpc<T>,
    }

    impl BiddingClient<tonic::transport::Channel> {
        pub async fn connect<D>(dst: D) -> std::result::Result<Self, tonic::transport::Error>
        where
            D: TryInto<tonic::transport::Endpoint>,
            D::Error: Into<StdError>,
        {
            let conn = tonic::transport::Endpoint::new(dst)?.connect().await?;
            Ok(Self::new(conn))
        }
    }

    impl<T> BiddingClient<T>
    where
        T: tonic::client::GrpcService<tonic::body::BoxBody>,
        T::Error: Into<StdError>,
        T::ResponseBody: Body<Data = Bytes> + Send + 'static,
        <T::ResponseBody as Body>::Error: Into<StdError> + Send,
    {
        pub fn new(inner: T) -> Self {
            Self { inner: tonic::client::Grpc::new(inner) }
        }

        pub async fn generate_bids(
            &mut self,
            request: impl tonic::IntoRequest<super::super::GenerateBidsRequest>,
        ) -> std::result::Result<tonic::Response<super::super::GenerateBidsResponse>, tonic::Status>
        {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/ba.Bidding/GenerateBids");
            let mut req = request.into_request();
            req.extensions_mut()
                .insert(GrpcMethod::new("ba.Bidding", "GenerateBids"));
            self.inner.unary(req, path, codec).await
        }
    }
}

/// Client and server for the auction service's `ScoreAds`.
pub mod auction {
    use tonic::codegen::*;

    #[async_trait]
    pub trait Auction: Send + Sync + 'static {
        /// Scores candidate bids and returns the winner, if any.
        async fn score_ads(
            &self,
            request: tonic::Request<super::super::ScoreAdsRequest>,
        ) -> std::result::Result<tonic::Response<super::super::ScoreAdsResponse>, tonic::Status>;
    }

    #[derive(Debug)]
    pub struct AuctionServer<T> {
        inner: Arc<T>,
    }

    impl<T> AuctionServer<T> {
        pub fn new(inner: T) -> Self {
            Self { inner: Arc::new(inner) }
        }
    }

    impl<T> Clone for AuctionServer<T> {
        fn clone(&self) -> Self {
            Self { inner: Arc::clone(&self.inner) }
        }
    }

    impl<T, B> tonic::codegen::Service<http::Request<B>> for AuctionServer<T>
    where
        T: Auction,
        B: Body + Send + 'static,
        B::Error: Into<StdError> + Send + 'static,
    {
        type Response = http::Response<tonic::body::BoxBody>;
        type Error = std::convert::Infallible;
        type Future = BoxFuture<Self::Response, Self::Error>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: http::Request<B>) -> Self::Future {
            match req.uri().path() {
                "/ba.Auction/ScoreAds" => {
                    struct ScoreAdsSvc<T>(Arc<T>);
                    impl<T: Auction> tonic::server::UnaryService<super::super::ScoreAdsRequest>
                        for ScoreAdsSvc<T>
                    {
                        type Response = super::super::ScoreAdsResponse;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::super::ScoreAdsRequest>,
                        ) -> Self::Future {
                            let inner = Arc::clone(&self.0);
                            Box::pin(async move { inner.score_ads(request).await })
                        }
                    }
                    let inner = Arc::clone(&self.inner);
                    Box::pin(async move {
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = tonic::server::Grpc::new(codec);
                        Ok(grpc.unary(ScoreAdsSvc(inner), req).await)
                    })
                }
                _ => Box::pin(async move {
                    Ok(http::Response::builder()
                        .status(200)
                        .header("grpc-status", "12")
                        .header("content-type", "application/grpc")
                        .body(empty_body())
                        .unwrap())
                }),
            }
        }
    }

    impl<T: Auction> tonic::server::NamedService for AuctionServer<T> {
        const NAME: &'static str = "ba.Auction";
    }

    #[derive(Debug, Clone)]
    pub struct AuctionClient<T> {
        inner: tonic::client::Grpc<T>,
    }

    impl AuctionClient<tonic::transport::Channel> {
        pub async fn connect<D>(dst: D) -> std::result::Result<Self, tonic::transport::Error>
        where
            D: TryInto<tonic::transport::Endpoint>,
            D::Error: Into<StdError>,
        {
            let conn = tonic::transport::Endpoint::new(dst)?.connect().await?;
            Ok(Self::new(conn))
        }
    }

    impl<T> AuctionClient<T>
    where
        T: tonic::client::GrpcService<tonic::body::BoxBody>,
        T::Error: Into<StdError>,
        T::ResponseBody: Body<Data = Bytes> + Send + 'static,
        <T::ResponseBody as Body>::Error: Into<StdError> + Send,
    {
        pub fn new(inner: T) -> Self {
            Self { inner: tonic::client::Grpc::new(inner) }
        }

        pub async fn score_ads(
            &mut self,
            request: impl tonic::IntoRequest<super::super::ScoreAdsRequest>,
        ) -> std::result::Result<tonic::Response<super::super::ScoreAdsResponse>, tonic::Status>
        {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = http::uri::PathAndQuery::from_static("/ba.Auction/ScoreAds");
            let mut req = request.into_request();
            req.extensions_mut()
                .insert(GrpcMethod::new("ba.Auction", "ScoreAds"));
            self.inner.unary(req, path, codec).await
        }
    }
}
