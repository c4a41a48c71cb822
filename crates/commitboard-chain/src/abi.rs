//! Contract ABI for the commitment board.
//!
//! Three functions and two events. The contract keeps one message per
//! address; history only exists in the event log.

#![allow(missing_docs)]

alloy_sol_types::sol! {
    event CommitSet(address indexed user, string message, uint256 timestamp);
    event CommitCleared(address indexed user, uint256 timestamp);

    function setCommit(string message) external;
    function clearCommit() external;
    function getCommit(address user) external view returns (string message, uint256 updatedAt);
}
