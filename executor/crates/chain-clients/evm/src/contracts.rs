use alloy::sol;

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    interface IToposCore {
        function networkSubnetId() external view returns (bytes32);
        function receiptRootToCertId(bytes32 receiptRoot) external view returns (bytes32);
    }
}

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    interface ISubnetRegistrator {
        function subnets(bytes32 subnetId)
            external
            view
            returns (
                string endpointHttp,
                string endpointWs,
                string logoURL,
                string name,
                string currencySymbol,
                uint256 chainId
            );
    }
}

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    interface IToposMessaging {
        error CertNotPresent();
        error IllegalMemoryAccess();
        error InvalidMerkleProof();
        error InvalidSubnetId();
        error InvalidTransactionStatus();
        error LogIndexOutOfRange();
        error TransactionAlreadyExecuted();
        error UnsupportedProofKind();

        function execute(uint256[] calldata logIndexes, bytes calldata proofBlob, bytes32 receiptRoot) external;
    }
}
