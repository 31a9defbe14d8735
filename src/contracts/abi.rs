//! ABI definitions for the PredictChain contracts

use alloy::sol;

sol! {
    interface IPredictionMarketFactory {
        function createMarket(
            string title,
            string description,
            string category,
            uint256 endTime
        ) external returns (address);
        function getAllMarkets() external view returns (address[]);
        function getMarketCount() external view returns (uint256);
    }

    interface IPredictionMarket {
        function placeBet(bool isYes) external payable;
        function resolveMarket(uint8 outcome) external;
        function claimWinnings() external;
        function claimRefund() external;
        function isBettingActive() external view returns (bool);
        function getTimeUntilBettingEnds() external view returns (uint256);
        function title() external view returns (string);
        function description() external view returns (string);
        function category() external view returns (string);
        function endTime() external view returns (uint256);
        function status() external view returns (uint8);
        function totalAmount() external view returns (uint256);
        function totalYesAmount() external view returns (uint256);
        function totalNoAmount() external view returns (uint256);
    }

    interface IPredictionDAO {
        struct Proposal {
            uint256 id;
            address proposer;
            string title;
            string description;
            uint8 proposalType;
            uint256 votesFor;
            uint256 votesAgainst;
            uint256 endTime;
            uint8 status;
        }

        function createProposal(
            string title,
            string description,
            uint8 proposalType
        ) external returns (uint256);
        function vote(uint256 proposalId, uint8 choice) external;
        function executeProposal(uint256 proposalId) external;
        function getActiveProposals() external view returns (Proposal[]);
        function proposalCounter() external view returns (uint256);
        function votingPower(address user) external view returns (uint256);
        function quorum() external view returns (uint256);
    }

    interface INFTReward {
        function awardMilestone(address user, uint8 milestone) external;
        function checkAndAwardMilestones(address user) external;
        function totalSupply() external view returns (uint256);
        function getUserMilestones(address user) external view returns (uint8[]);
    }

    interface IUserProfile {
        struct Profile {
            string username;
            string bio;
            string avatarUri;
            uint256 createdAt;
            bool exists;
        }

        struct UserStats {
            uint256 totalPredictions;
            uint256 correctPredictions;
            uint256 totalEarnings;
            uint256 reputation;
            uint256 level;
        }

        function createProfile(string username, string bio, string avatarUri) external;
        function updateProfile(string username, string bio, string avatarUri) external;
        function getProfile(address user) external view returns (Profile);
        function getUserStats(address user) external view returns (UserStats);
    }
}
